//! Attaching an uploader to a file-selection control
//!
//! [`initialize`] validates the environment and configuration, wires the
//! transport and spawns the loop that owns the [`UploadController`]. All
//! state transitions happen on that single task: handle commands and
//! transport events are processed one at a time, in arrival order.

use crate::model::error::{InitError, UploaderClosed};
use crate::model::file_queue::FileQueue;
use crate::model::run_state::SessionSnapshot;
use crate::services::page::Page;
use crate::services::transport::{Transport, TransportEvent};
use crate::services::upload_controller::UploadController;
use crate::settings::callbacks::Callbacks;
use crate::settings::session_config::{SessionConfig, SessionOptions};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::oneshot;

/// Kind of element an uploader can be attached to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlKind {
    /// A control that lets the user pick files
    FileInput,
    Other(String),
}

/// An element of the host page. Remembers the uploader bound to it.
#[derive(Debug)]
pub struct Control {
    id: String,
    kind: ControlKind,
    binding: Option<UploaderHandle>,
}

impl Control {
    pub fn new(id: impl Into<String>, kind: ControlKind) -> Self {
        Control {
            id: id.into(),
            kind,
            binding: None,
        }
    }

    pub fn file_input(id: impl Into<String>) -> Self {
        Self::new(id, ControlKind::FileInput)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_file_input(&self) -> bool {
        self.kind == ControlKind::FileInput
    }

    /// Uploader bound to this control, if initialized
    pub fn handle(&self) -> Option<&UploaderHandle> {
        self.binding.as_ref()
    }
}

/// Result of a successful [`initialize`]
#[derive(Debug)]
pub enum Attachment {
    Active(UploaderHandle),
    /// The host cannot upload and the `unsupported` callback was invoked instead
    Unsupported,
}

impl Attachment {
    pub fn handle(self) -> Option<UploaderHandle> {
        match self {
            Attachment::Active(handle) => Some(handle),
            Attachment::Unsupported => None,
        }
    }
}

#[derive(Debug)]
enum Command {
    Select(FileQueue),
    Abort,
    Snapshot(oneshot::Sender<SessionSnapshot>),
    Shutdown,
}

/// Cloneable handle to a running uploader
#[derive(Debug, Clone)]
pub struct UploaderHandle {
    control_id: String,
    command_tx: UnboundedSender<Command>,
}

impl UploaderHandle {
    pub fn control_id(&self) -> &str {
        &self.control_id
    }

    /// Selection-changed listener: start uploading a new set of files
    pub fn select(&self, files: impl Into<FileQueue>) -> Result<(), UploaderClosed> {
        self.command(Command::Select(files.into()))
    }

    /// Cancel the file currently uploading; a no-op when nothing is in flight
    pub fn abort(&self) -> Result<(), UploaderClosed> {
        self.command(Command::Abort)
    }

    /// Current configuration and run state
    pub async fn snapshot(&self) -> Result<SessionSnapshot, UploaderClosed> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command(Command::Snapshot(reply_tx))?;
        reply_rx.await.map_err(|_| UploaderClosed)
    }

    /// Stop the uploader, cancelling any request in flight
    pub fn shutdown(&self) -> Result<(), UploaderClosed> {
        self.command(Command::Shutdown)
    }

    pub fn is_closed(&self) -> bool {
        self.command_tx.is_closed()
    }

    /// Whether both handles drive the same uploader
    pub fn same_uploader(&self, other: &UploaderHandle) -> bool {
        self.command_tx.same_channel(&other.command_tx)
    }

    fn command(&self, command: Command) -> Result<(), UploaderClosed> {
        self.command_tx.send(command).map_err(|_| UploaderClosed)
    }
}

/// Attach an uploader to `control`.
///
/// Must be called from within a tokio runtime. Initializing a control that
/// already has an uploader returns the existing handle and ignores the
/// remaining arguments.
pub fn initialize<T, P>(
    control: &mut Control,
    options: SessionOptions,
    mut callbacks: Callbacks,
    page: P,
    mut transport: T,
) -> Result<Attachment, InitError>
where
    T: Transport,
    P: Page,
{
    let config = SessionConfig::from(options);

    if !page.supports_file_list() {
        return match callbacks.unsupported.as_mut() {
            Some(unsupported) => {
                tracing::info!("File lists unsupported, handing over to fallback");
                unsupported();
                Ok(Attachment::Unsupported)
            }
            None => Err(InitError::UnsupportedEnvironment),
        };
    }
    if !control.is_file_input() {
        return Err(InitError::InvalidTarget(control.id.clone()));
    }
    config.validate()?;

    if let Some(handle) = &control.binding {
        tracing::debug!("Control {} already has an uploader", control.id);
        return Ok(Attachment::Active(handle.clone()));
    }

    let (event_tx, event_rx) = mpsc::unbounded_channel::<TransportEvent>();
    transport.wire(event_tx);
    let (command_tx, command_rx) = mpsc::unbounded_channel::<Command>();

    tracing::info!("Uploader attached to {} posting to {}", control.id, config.endpoint_url());
    let controller = UploadController::new(config, callbacks, transport, page);
    tokio::spawn(main_loop(controller, command_rx, event_rx));

    let handle = UploaderHandle {
        control_id: control.id.clone(),
        command_tx,
    };
    control.binding = Some(handle.clone());
    Ok(Attachment::Active(handle))
}

async fn main_loop<T, P>(
    mut controller: UploadController<T, P>,
    mut command_rx: UnboundedReceiver<Command>,
    mut event_rx: UnboundedReceiver<TransportEvent>,
) where
    T: Transport,
    P: Page,
{
    loop {
        tokio::select! {
            command = command_rx.recv() => match command {
                Some(Command::Select(files)) => controller.select(files),
                Some(Command::Abort) => {
                    controller.abort();
                }
                Some(Command::Snapshot(reply)) => {
                    let _ = reply.send(controller.snapshot());
                }
                Some(Command::Shutdown) | None => break,
            },
            Some(event) = event_rx.recv() => controller.handle_event(event),
        }
    }

    if controller.outstanding().is_some() {
        controller.transport_mut().abort();
    }
    tracing::debug!("Uploader loop stopped");
}
