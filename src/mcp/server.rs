//! MCP server: registry, dispatcher and session behind one line-oriented loop.
//!
//! The server lifecycle:
//!
//! 1. **Initialisation**: Capability negotiation and version agreement
//! 2. **Operation**: Handling requests, emitting list-changed notifications
//! 3. **Shutdown**: EOF on the input, SIGINT/SIGTERM, or Ctrl+C on Windows

use std::io;

use indexmap::IndexSet;
use tokio::io::{AsyncBufRead, AsyncWrite};
use tokio::sync::mpsc::{self, UnboundedReceiver};

use crate::config::Config;
use crate::mcp::dispatcher::{Dispatcher, RequestContext};
use crate::mcp::protocol::{Message, Notification, SERVER_NAME};
use crate::mcp::session::Session;
use crate::mcp::transport::{LineTransport, StdioTransport};
use crate::registry::{ListChanged, Registry};

/// Default number of entries per listing page.
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Server identity and listing limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    /// Name reported in `serverInfo`.
    pub name: String,
    /// Version reported in `serverInfo`.
    pub version: String,
    /// Usage hints returned from `initialize`.
    pub instructions: Option<String>,
    /// Maximum entries per listing page.
    pub page_size: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            name: SERVER_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            instructions: None,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl From<&Config> for ServerSettings {
    fn from(config: &Config) -> Self {
        Self {
            name: config.server.name.clone(),
            version: config.server.version.clone(),
            instructions: config.server.instructions.clone(),
            page_size: config.pagination.page_size,
        }
    }
}

/// The MCP server.
#[derive(Debug)]
pub struct McpServer {
    registry: Registry,
    dispatcher: Dispatcher,
    session: Session,
    settings: ServerSettings,
    changes: UnboundedReceiver<ListChanged>,
}

impl McpServer {
    /// Creates a server with an empty registry and the built-in handlers.
    #[must_use]
    pub fn new(settings: ServerSettings) -> Self {
        let (sender, changes) = mpsc::unbounded_channel();
        let mut registry = Registry::new();
        registry.on_list_changed(move |kind| {
            // The receiver lives as long as the server.
            let _ = sender.send(kind);
        });

        Self {
            registry,
            dispatcher: Dispatcher::new(),
            session: Session::new(),
            settings,
            changes,
        }
    }

    /// The capability registry.
    #[must_use]
    pub const fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Mutable access for registering capabilities.
    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    /// Mutable access for installing extra method handlers.
    pub fn dispatcher_mut(&mut self) -> &mut Dispatcher {
        &mut self.dispatcher
    }

    /// The current session.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    #[must_use]
    pub const fn settings(&self) -> &ServerSettings {
        &self.settings
    }

    /// Handles one input line, returning the serialised reply if any.
    pub fn handle_line(&mut self, line: &str) -> Option<String> {
        let reply = self.handle(line)?;
        match reply.to_json() {
            Ok(json) => Some(json),
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialise reply");
                None
            }
        }
    }

    /// Handles one input line, returning the reply message if any.
    pub fn handle(&mut self, line: &str) -> Option<Message> {
        let mut context = RequestContext {
            registry: &self.registry,
            session: &mut self.session,
            settings: &self.settings,
        };
        self.dispatcher.process(line, &mut context)
    }

    /// Drains registry changes into list-changed notifications.
    ///
    /// Changes made before the client confirmed initialisation are dropped;
    /// the client lists everything once it is ready. Repeated changes to one
    /// collection collapse into a single notification.
    pub fn pending_notifications(&mut self) -> Vec<Notification> {
        let mut methods = IndexSet::new();
        while let Ok(kind) = self.changes.try_recv() {
            methods.insert(kind.notification_method());
        }

        if !self.session.is_initialized() {
            if !methods.is_empty() {
                tracing::trace!(count = methods.len(), "Dropping list changes before initialisation");
            }
            return Vec::new();
        }

        methods
            .into_iter()
            .map(|method| Notification::new(method, None))
            .collect()
    }

    /// Runs the server over stdin/stdout until shutdown.
    ///
    /// # Errors
    ///
    /// Returns an error if transport I/O fails.
    pub async fn run(&mut self) -> io::Result<()> {
        let mut transport = StdioTransport::stdio();
        self.serve(&mut transport).await
    }

    /// Runs the main loop over `transport` and handles shutdown.
    ///
    /// # Errors
    ///
    /// Returns an error if transport I/O fails.
    #[cfg(unix)]
    pub async fn serve<R, W>(&mut self, transport: &mut LineTransport<R, W>) -> io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigint = signal(SignalKind::interrupt()).map_err(io::Error::other)?;
        let mut sigterm = signal(SignalKind::terminate()).map_err(io::Error::other)?;

        // Notifications queued by registrations made before the loop started.
        self.flush_notifications(transport).await?;

        loop {
            tokio::select! {
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT, initiating graceful shutdown");
                    return Ok(());
                }

                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM, initiating graceful shutdown");
                    return Ok(());
                }

                line_result = transport.read_line() => {
                    if self.handle_transport_result(line_result, transport).await? {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Runs the main loop over `transport` and handles shutdown.
    ///
    /// # Errors
    ///
    /// Returns an error if transport I/O fails.
    #[cfg(windows)]
    pub async fn serve<R, W>(&mut self, transport: &mut LineTransport<R, W>) -> io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        self.flush_notifications(transport).await?;

        loop {
            tokio::select! {
                _ = &mut ctrl_c => {
                    tracing::info!("Received Ctrl+C, initiating graceful shutdown");
                    return Ok(());
                }

                line_result = transport.read_line() => {
                    if self.handle_transport_result(line_result, transport).await? {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Handles the result from transport read.
    ///
    /// Returns `true` if the server should shut down.
    async fn handle_transport_result<R, W>(
        &mut self,
        line_result: io::Result<Option<String>>,
        transport: &mut LineTransport<R, W>,
    ) -> io::Result<bool>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let Some(line) = line_result? else {
            tracing::info!("Input closed, shutting down");
            return Ok(true);
        };

        if line.trim().is_empty() {
            return Ok(false);
        }

        if let Some(reply) = self.handle_line(&line) {
            transport.write_line(&reply).await?;
        }
        self.flush_notifications(transport).await?;

        Ok(false)
    }

    async fn flush_notifications<R, W>(&mut self, transport: &mut LineTransport<R, W>) -> io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        for notification in self.pending_notifications() {
            tracing::debug!(method = %notification.method, "Sending notification");
            transport.write_message(&Message::from(notification)).await?;
        }
        Ok(())
    }
}

impl Default for McpServer {
    fn default() -> Self {
        Self::new(ServerSettings::default())
    }
}
