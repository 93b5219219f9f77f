//! services/client/src/cli/repl.rs
//!
//! The interactive loop. Reads one line at a time, turns it into a controller
//! call and prints the result. Session errors are printed and the loop goes
//! on; only I/O failures on the terminal end it.

use crate::cli::command::{self, Command, HELP};
use crate::cli::render;
use crate::config::Config;
use crate::error::{ClientError, SessionError};
use crate::session::controller::{AskOutcome, SessionController};
use crate::session::document_registry::DocumentListing;
use crate::session::upload::passes_picker_filter;
use pocket_rag_core::domain::{DocumentId, Scope, UploadFile};
use std::path::Path;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, Lines};
use tracing::{info, warn};

/// Runs the loop until `/quit` or end of input.
pub async fn run<R, W>(
    controller: SessionController,
    config: &Config,
    input: R,
    output: W,
) -> Result<(), ClientError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut repl = Repl {
        controller,
        snippet_chars: config.snippet_preview_chars,
        lines: input.lines(),
        output,
        shown_documents: Vec::new(),
    };
    repl.start().await?;
    while let Some(line) = repl.read_line().await? {
        match command::parse(&line) {
            Ok(Some(Command::Quit)) => break,
            Ok(Some(cmd)) => repl.handle(cmd).await?,
            Ok(None) => {}
            Err(e) => repl.report(&e).await?,
        }
    }
    repl.output.flush().await?;
    info!("Leaving the session.");
    Ok(())
}

struct Repl<R, W> {
    controller: SessionController,
    snippet_chars: usize,
    lines: Lines<R>,
    output: W,
    /// Ids of the documents in the order they were last printed, for `/delete <n>`.
    shown_documents: Vec<DocumentId>,
}

impl<R, W> Repl<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    async fn start(&mut self) -> Result<(), ClientError> {
        if let Err(e) = self.controller.refresh_scopes().await {
            warn!("Could not fetch scopes at startup: {}", e);
            self.say(&format!("Could not load subjects: {}", e)).await?;
        }
        let snapshot = self.controller.snapshot().await;
        self.say(&render::header(snapshot.current_scope.as_ref())).await?;
        self.say(&render::scope_list(&snapshot.scopes, snapshot.current_scope.as_ref()))
            .await?;
        self.say("Type /help for commands.").await
    }

    async fn read_line(&mut self) -> Result<Option<String>, ClientError> {
        let current = self.controller.current_scope().await;
        self.output
            .write_all(render::prompt(current.as_ref()).as_bytes())
            .await?;
        self.output.flush().await?;
        Ok(self.lines.next_line().await?)
    }

    async fn say(&mut self, text: &str) -> Result<(), ClientError> {
        self.output.write_all(text.as_bytes()).await?;
        self.output.write_all(b"\n").await?;
        Ok(())
    }

    async fn report(&mut self, err: &SessionError) -> Result<(), ClientError> {
        self.say(&format!("! {}", err)).await
    }

    async fn handle(&mut self, cmd: Command) -> Result<(), ClientError> {
        let result = match cmd {
            Command::Scopes => self.list_scopes().await,
            Command::New(name) => self.create_scope(&name).await,
            Command::Use(target) => self.use_scope(&target).await,
            Command::Global => self.switch(None).await,
            Command::Rename { target, name } => self.rename_scope(&target, &name).await,
            Command::Docs => self.show_documents(false).await,
            Command::Refresh => self.show_documents(true).await,
            Command::Delete(n) => self.delete_document(n).await,
            Command::Pick(path) => self.pick(&path).await,
            Command::Upload => self.upload().await,
            Command::Help => Ok(self.say(HELP).await?),
            Command::Ask(question) => self.ask(&question).await,
            Command::Quit => Ok(()),
        };
        match result {
            Ok(()) => Ok(()),
            Err(Failure::Session(e)) => self.report(&e).await,
            Err(Failure::Client(e)) => Err(e),
        }
    }

    async fn list_scopes(&mut self) -> Result<(), Failure> {
        let scopes = self.controller.refresh_scopes().await?;
        let current = self.controller.current_scope().await;
        self.say(&render::scope_list(&scopes, current.as_ref())).await?;
        Ok(())
    }

    async fn create_scope(&mut self, name: &str) -> Result<(), Failure> {
        let scope = self.controller.create_scope(name).await?;
        self.shown_documents.clear();
        self.say(&render::header(Some(&scope))).await?;
        Ok(())
    }

    /// Resolves `/use` and `/rename` targets: a 1-based list number first, then an exact
    /// (case-insensitive) name.
    async fn resolve_scope(&self, target: &str) -> Result<Scope, SessionError> {
        let scopes = self.controller.snapshot().await.scopes;
        let by_number = target
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| scopes.get(i));
        by_number
            .or_else(|| scopes.iter().find(|s| s.name.eq_ignore_ascii_case(target)))
            .cloned()
            .ok_or_else(|| {
                SessionError::validation(format!(
                    "No subject '{}'. Type /scopes to list them.",
                    target
                ))
            })
    }

    async fn use_scope(&mut self, target: &str) -> Result<(), Failure> {
        let scope = self.resolve_scope(target).await?;
        self.switch(Some(scope)).await
    }

    async fn switch(&mut self, scope: Option<Scope>) -> Result<(), Failure> {
        let selected = self.controller.select_scope(scope.as_ref().map(|s| &s.id)).await?;
        self.shown_documents.clear();
        self.say(&render::header(selected.as_ref())).await?;
        Ok(())
    }

    async fn rename_scope(&mut self, target: &str, name: &str) -> Result<(), Failure> {
        let scope = self.resolve_scope(target).await?;
        let renamed = self.controller.rename_scope(&scope.id, name).await?;
        self.say(&format!("Renamed '{}' to '{}'.", scope.name, renamed.name)).await?;
        Ok(())
    }

    /// Prints the current scope's documents, fetching them when `refetch` is set
    /// or no loaded listing is cached. A failed fetch is always retried.
    async fn show_documents(&mut self, refetch: bool) -> Result<(), Failure> {
        let cached = match self.controller.document_listing().await {
            Some(listing @ DocumentListing::Loaded(_)) if !refetch => Some(listing),
            _ => None,
        };
        let listing = match cached {
            Some(listing) => listing,
            None => match self.controller.open_documents().await {
                Ok(documents) => DocumentListing::Loaded(documents),
                Err(e) => match self.controller.document_listing().await {
                    Some(listing @ DocumentListing::Failed(_)) => listing,
                    _ => return Err(e.into()),
                },
            },
        };
        self.shown_documents = match &listing {
            DocumentListing::Loaded(documents) => documents.iter().map(|d| d.id.clone()).collect(),
            DocumentListing::Failed(_) => Vec::new(),
        };
        self.say(&render::document_list(&listing)).await?;
        Ok(())
    }

    async fn delete_document(&mut self, n: usize) -> Result<(), Failure> {
        let document_id = self
            .shown_documents
            .get(n - 1)
            .cloned()
            .ok_or_else(|| SessionError::validation(format!("No document {}. Type /docs first.", n)))?;
        let pending = self.controller.request_delete(&document_id).await?;
        self.say(&format!("{} ({}) [y/N]", pending.prompt(), pending.document().filename))
            .await?;
        self.output.flush().await?;

        let answer = self.lines.next_line().await?.unwrap_or_default();
        if !matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes") {
            drop(pending);
            self.say("Cancelled.").await?;
            return Ok(());
        }
        let deleted = self.controller.confirm_delete(pending).await?;
        self.say(&format!("Deleted {}.", deleted.filename)).await?;
        self.show_documents(false).await
    }

    async fn pick(&mut self, path: &Path) -> Result<(), Failure> {
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default()
            .to_string();
        if !passes_picker_filter(&filename) {
            return Err(SessionError::validation("Only PDF files can be uploaded.").into());
        }
        let content = tokio::fs::read(path).await.map_err(|e| {
            SessionError::validation(format!("Could not read {}: {}", path.display(), e))
        })?;
        self.controller
            .select_file(UploadFile::new(filename, content))
            .await?;
        let state = self.controller.upload_state().await;
        self.say(&render::upload_state(&state)).await?;
        Ok(())
    }

    async fn upload(&mut self) -> Result<(), Failure> {
        let notice = self.controller.upload().await;
        let state = self.controller.upload_state().await;
        match notice {
            Ok(notice) => {
                self.say(&render::upload_state(&state)).await?;
                info!(
                    "Upload of '{}' into '{}' acknowledged (status {:?}).",
                    notice.filename, notice.scope.name, notice.receipt.status
                );
                self.controller.dismiss_upload().await?;
                Ok(())
            }
            Err(e) if e.is_validation() => Err(e.into()),
            Err(_) => {
                self.say(&render::upload_state(&state)).await?;
                self.controller.dismiss_upload().await?;
                Ok(())
            }
        }
    }

    async fn ask(&mut self, question: &str) -> Result<(), Failure> {
        match self.controller.ask(question).await? {
            AskOutcome::Answered(turn) | AskOutcome::Failed(turn) => {
                self.say(&render::turn(&turn, self.snippet_chars)).await?;
            }
            AskOutcome::Discarded => {}
        }
        Ok(())
    }
}

/// Either a session error to show, or a terminal failure that ends the loop.
enum Failure {
    Session(SessionError),
    Client(ClientError),
}

impl From<SessionError> for Failure {
    fn from(err: SessionError) -> Self {
        Failure::Session(err)
    }
}

impl From<ClientError> for Failure {
    fn from(err: ClientError) -> Self {
        Failure::Client(err)
    }
}

impl From<std::io::Error> for Failure {
    fn from(err: std::io::Error) -> Self {
        Failure::Client(err.into())
    }
}
