use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, Instrument};

use crate::viewer::{Command, Effect};
use crate::{DocumentBackend, DocumentId, DocumentProvider, TranslationService, UploadService};

/// The collaborators network effects are executed against.
#[derive(Clone)]
pub struct Services {
    pub uploader: Arc<dyn UploadService>,
    pub translator: Arc<dyn TranslationService>,
    pub provider: Arc<dyn DocumentProvider>,
}

/// A finished background operation, to be fed back into the event loop.
pub enum Completion {
    Command(Command),
    /// The engine opened `document`; the backend is only worth keeping while
    /// that document is still the viewer's current one.
    Opened {
        document: DocumentId,
        backend: Arc<dyn DocumentBackend>,
    },
}

impl Completion {
    /// Splits into the command the viewer must see and, for opened
    /// documents, the backend to display pages from.
    pub fn into_parts(self) -> (Command, Option<(DocumentId, Arc<dyn DocumentBackend>)>) {
        match self {
            Completion::Command(command) => (command, None),
            Completion::Opened { document, backend } => {
                let command = Command::DocumentReady {
                    document,
                    page_count: backend.page_count(),
                };
                (command, Some((document, backend)))
            }
        }
    }
}

/// Issues network effects on tokio tasks and reports back over a channel.
///
/// Nothing is ever cancelled: superseded results still arrive and the viewer
/// drops them by identity.
pub struct EffectRunner {
    services: Services,
    tx: UnboundedSender<Completion>,
}

impl EffectRunner {
    pub fn new(services: Services) -> (Self, UnboundedReceiver<Completion>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { services, tx }, rx)
    }

    /// Starts `effect` if it is a network effect; presentation effects are
    /// handed back to the caller.
    pub fn run(&self, effect: Effect) -> Option<Effect> {
        match effect {
            Effect::Upload { ticket, file } => {
                let uploader = Arc::clone(&self.services.uploader);
                let tx = self.tx.clone();
                let span = tracing::info_span!("upload", ?ticket, file = %file.name);
                tokio::spawn(
                    async move {
                        let result = uploader.upload(file).await;
                        send(&tx, Completion::Command(Command::UploadFinished { ticket, result }));
                    }
                    .instrument(span),
                );
                None
            }
            Effect::OpenDocument {
                document,
                reference,
            } => {
                let provider = Arc::clone(&self.services.provider);
                let tx = self.tx.clone();
                let span = tracing::info_span!("open", %document, %reference);
                tokio::spawn(
                    async move {
                        let completion = match provider.open(&reference).await {
                            Ok(backend) => Completion::Opened { document, backend },
                            Err(err) => Completion::Command(Command::DocumentFailed {
                                document,
                                message: format!("{err:#}"),
                            }),
                        };
                        send(&tx, completion);
                    }
                    .instrument(span),
                );
                None
            }
            Effect::Translate { sequence, text } => {
                let translator = Arc::clone(&self.services.translator);
                let tx = self.tx.clone();
                let span = tracing::info_span!("translate", sequence);
                tokio::spawn(
                    async move {
                        let result = translator.translate(&text).await;
                        send(&tx, Completion::Command(Command::Translated { sequence, result }));
                    }
                    .instrument(span),
                );
                None
            }
            ui @ (Effect::ScrollToTop | Effect::SelectPageInput) => Some(ui),
        }
    }
}

fn send(tx: &UnboundedSender<Completion>, completion: Completion) {
    if tx.send(completion).is_err() {
        debug!("event loop gone, dropping completion");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use anyhow::{anyhow, Result};
    use parking_lot::Mutex;
    use tokio::sync::Notify;

    use crate::viewer::Viewer;
    use crate::{
        DocumentRef, ServiceError, TranslationStatus, UploadFile, UploadedDocument,
    };

    struct FakeUploader;

    #[async_trait::async_trait]
    impl UploadService for FakeUploader {
        async fn upload(&self, file: UploadFile) -> Result<UploadedDocument, ServiceError> {
            if file.bytes.is_empty() {
                return Err(ServiceError::rejected("corrupt file"));
            }
            Ok(UploadedDocument {
                file_name: file.name.clone(),
                reference: DocumentRef::new(format!("http://localhost:8000/pdfs/{}", file.name)),
            })
        }
    }

    /// Holds back the answer for "hello world" until released, so a later
    /// selection can overtake it.
    struct GatedTranslator {
        gate: Notify,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl TranslationService for GatedTranslator {
        async fn translate(&self, text: &str) -> Result<String, ServiceError> {
            self.calls.lock().push(text.to_owned());
            match text {
                "hello world" => {
                    self.gate.notified().await;
                    Ok("hallo welt".into())
                }
                "foo" => Ok("bar".into()),
                _ => Err(ServiceError::rejected("unsupported")),
            }
        }
    }

    struct FakeBackend {
        pages: usize,
    }

    impl DocumentBackend for FakeBackend {
        fn page_count(&self) -> usize {
            self.pages
        }

        fn page_text(&self, page_index: usize) -> Result<String> {
            Ok(format!("page {}", page_index + 1))
        }
    }

    struct FakeProvider;

    #[async_trait::async_trait]
    impl DocumentProvider for FakeProvider {
        async fn open(&self, reference: &DocumentRef) -> Result<Arc<dyn DocumentBackend>> {
            if reference.as_str().ends_with("broken.pdf") {
                return Err(anyhow!("invalid header"));
            }
            Ok(Arc::new(FakeBackend { pages: 5 }))
        }
    }

    struct Harness {
        viewer: Viewer,
        runner: EffectRunner,
        rx: UnboundedReceiver<Completion>,
        translator: Arc<GatedTranslator>,
        backend: Option<(DocumentId, Arc<dyn DocumentBackend>)>,
    }

    impl Harness {
        fn new() -> Self {
            let translator = Arc::new(GatedTranslator {
                gate: Notify::new(),
                calls: Mutex::new(Vec::new()),
            });
            let services = Services {
                uploader: Arc::new(FakeUploader),
                translator: translator.clone(),
                provider: Arc::new(FakeProvider),
            };
            let (runner, rx) = EffectRunner::new(services);
            Self {
                viewer: Viewer::new(),
                runner,
                rx,
                translator,
                backend: None,
            }
        }

        fn dispatch(&mut self, command: Command) -> Vec<Effect> {
            self.viewer
                .apply(command)
                .into_iter()
                .filter_map(|effect| self.runner.run(effect))
                .collect()
        }

        async fn pump(&mut self) -> Vec<Effect> {
            let completion = tokio::time::timeout(Duration::from_secs(5), self.rx.recv())
                .await
                .expect("completion within timeout")
                .expect("channel open");
            let (command, backend) = completion.into_parts();
            if backend.is_some() {
                self.backend = backend;
            }
            self.dispatch(command)
        }
    }

    #[tokio::test]
    async fn upload_open_and_navigate() {
        let mut harness = Harness::new();
        assert!(harness
            .dispatch(Command::Load(UploadFile::new("paper.pdf", b"%PDF".to_vec())))
            .is_empty());
        assert!(harness.pump().await.is_empty());
        assert_eq!(harness.pump().await, vec![Effect::ScrollToTop]);

        assert_eq!(harness.viewer.page_count(), Some(5));
        let (document, backend) = harness.backend.clone().unwrap();
        assert_eq!(harness.viewer.document().unwrap().id, document);
        assert_eq!(backend.page_text(0).unwrap(), "page 1");

        assert_eq!(harness.dispatch(Command::NextPage), vec![Effect::ScrollToTop]);
        assert_eq!(harness.viewer.current_page(), 2);
    }

    #[tokio::test]
    async fn upload_rejection_is_reported() {
        let mut harness = Harness::new();
        harness.dispatch(Command::Load(UploadFile::new("empty.pdf", Vec::<u8>::new())));
        harness.pump().await;
        assert_eq!(
            harness.viewer.status(),
            crate::ViewerStatus::UploadFailed {
                message: "corrupt file"
            }
        );
    }

    #[tokio::test]
    async fn engine_failure_becomes_load_failure() {
        let mut harness = Harness::new();
        harness.dispatch(Command::Load(UploadFile::new("broken.pdf", b"junk".to_vec())));
        harness.pump().await;
        harness.pump().await;
        assert!(harness.viewer.document().is_none());
        assert!(matches!(
            harness.viewer.status(),
            crate::ViewerStatus::LoadFailed { message } if message.ends_with("invalid header")
        ));
    }

    #[tokio::test]
    async fn later_selection_overtakes_slow_translation() {
        let mut harness = Harness::new();
        harness.dispatch(Command::Load(UploadFile::new("paper.pdf", b"%PDF".to_vec())));
        harness.pump().await;
        harness.pump().await;

        harness.dispatch(Command::PointerReleased {
            within_content_area: true,
            text: Some("hello world".into()),
        });
        harness.dispatch(Command::PointerReleased {
            within_content_area: true,
            text: Some("foo".into()),
        });

        // "foo" answers first.
        harness.pump().await;
        let overlay = harness.viewer.overlay().unwrap();
        assert_eq!(overlay.original, "foo");
        assert_eq!(overlay.translated_text, Some("bar"));

        harness.translator.gate.notify_one();
        harness.pump().await;
        let overlay = harness.viewer.overlay().unwrap();
        assert_eq!(overlay.original, "foo");
        assert_eq!(overlay.status, TranslationStatus::Success);
        assert_eq!(overlay.translated_text, Some("bar"));
        assert_eq!(
            harness.translator.calls.lock().as_slice(),
            ["hello world".to_owned(), "foo".to_owned()]
        );
    }

    #[test]
    fn presentation_effects_are_returned() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        let _guard = runtime.enter();
        let (runner, _rx) = EffectRunner::new(Harness::new().runner.services.clone());
        assert_eq!(runner.run(Effect::ScrollToTop), Some(Effect::ScrollToTop));
        assert_eq!(
            runner.run(Effect::SelectPageInput),
            Some(Effect::SelectPageInput)
        );
    }
}
