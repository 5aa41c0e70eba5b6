#![forbid(unsafe_code)]
mod cli;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use clap::Parser;
use cli::Cli;
use color_eyre::eyre::{self, eyre, WrapErr};
use crossterm::cursor::MoveToColumn;
use crossterm::terminal::{Clear, ClearType};
use humansize::{file_size_opts as options, FileSize};
use tokio::sync::mpsc;
use upload_queue::model::file_descriptor::FileDescriptor;
use upload_queue::model::file_queue::FileQueue;
use upload_queue::model::run_state::SessionSnapshot;
use upload_queue::services::console_page::{ConsolePage, ProgressLabel};
use upload_queue::services::http_transport::HttpTransport;
use upload_queue::services::uploader::{initialize, Control};
use upload_queue::settings::callbacks::Callbacks;
use upload_queue::settings::file_settings::load_options;
use upload_queue::settings::session_config::SessionConfig;
use upload_queue::utils::{initialize_logging, initialize_panic_handler};

/// Print a line to stdout without leaving a half-drawn progress bar behind
fn report(line: String) {
    let _ = crossterm::execute!(
        std::io::stderr(),
        MoveToColumn(0),
        Clear(ClearType::CurrentLine)
    );
    println!("{}", line);
}

fn human_size(bytes: u64) -> String {
    bytes
        .file_size(options::CONVENTIONAL)
        .unwrap_or_else(|_| "0 B".to_string())
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    initialize_logging()?;
    initialize_panic_handler()?;
    let args = Cli::parse();
    let options = args.apply(load_options(args.config.clone())?);

    let files = args
        .files
        .iter()
        .map(|path| {
            FileDescriptor::from_path(path)
                .wrap_err_with(|| format!("Cannot upload {}", path.display()))
        })
        .collect::<eyre::Result<Vec<_>>>()?;
    let queue = FileQueue::from(files);
    let total = queue.len();
    report(format!(
        "Uploading {} file(s), {}",
        total,
        human_size(queue.total_size())
    ));

    let limit = SessionConfig::from(options.clone()).size_limit();
    let label = ProgressLabel::default();
    let uploaded = Arc::new(AtomicUsize::new(0));
    let failed = Arc::new(AtomicUsize::new(0));
    let (done_tx, mut done_rx) = mpsc::unbounded_channel::<SessionSnapshot>();

    let callbacks = Callbacks::new()
        .on_populate_display(|display_id, file| {
            report(format!(
                "{:<12} {:>10}  {}",
                display_id,
                human_size(file.resolved_size()),
                file.resolved_name()
            ));
        })
        .on_pre_upload({
            let label = label.clone();
            move |file, display_id| {
                if let Some(limit) = limit.filter(|limit| file.resolved_size() > *limit) {
                    tracing::warn!("{} exceeds the {} byte limit", file.resolved_name(), limit);
                    report(format!(
                        "warning: {} is larger than {}, sending anyway",
                        file.resolved_name(),
                        human_size(limit)
                    ));
                }
                label.set(format!("{} {}", display_id, file.resolved_name()));
            }
        })
        .on_post_upload({
            let label = label.clone();
            let uploaded = uploaded.clone();
            move |_headers, _response| {
                uploaded.fetch_add(1, Ordering::SeqCst);
                report(format!("{}: uploaded", label.get()));
            }
        })
        .on_error({
            let label = label.clone();
            let failed = failed.clone();
            move |error| {
                failed.fetch_add(1, Ordering::SeqCst);
                let cancelled = error.session().is_some_and(|snapshot| {
                    snapshot
                        .current_display_id()
                        .is_some_and(|id| snapshot.state.was_aborted(&id))
                });
                if cancelled {
                    report(format!("{}: cancelled", label.get()));
                } else {
                    report(format!("{}: failed, {}", label.get(), error));
                }
            }
        })
        .on_all_complete(move |snapshot| {
            let _ = done_tx.send(snapshot.clone());
        });

    let transport = HttpTransport::new().wrap_err("Cannot create HTTP client")?;
    let page = ConsolePage::new(std::io::stderr(), label);
    let mut control = Control::file_input("files");
    let handle = initialize(&mut control, options, callbacks, page, transport)?
        .handle()
        .ok_or_else(|| eyre!("File uploads are not supported"))?;
    handle.select(queue)?;

    let snapshot = loop {
        tokio::select! {
            done = done_rx.recv() => break done,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, cancelling the current file");
                handle.abort()?;
            }
        }
    };
    let _ = handle.shutdown();
    let snapshot = snapshot.ok_or_else(|| eyre!("Uploader stopped before finishing"))?;
    tracing::info!("Run finished at index {:?}", snapshot.state.index());

    let uploaded = uploaded.load(Ordering::SeqCst);
    let failed = failed.load(Ordering::SeqCst);
    report(format!("{} of {} files uploaded, {} failed", uploaded, total, failed));
    if failed > 0 {
        return Err(eyre!("{} of {} files failed to upload", failed, total));
    }
    Ok(())
}
