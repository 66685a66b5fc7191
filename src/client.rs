use crate::command::{check_reply, command_name};
use crate::config::ClientOptions;
use crate::database::Database;
use crate::errors::DbError;
use crate::settings::{ReadPreference, Settings, WriteConcern};
use crate::transport::Transport;
use bson::Document;
use log::{debug, trace};

/// Session handle: owns the transport and the default settings every
/// database minted from it starts with.
///
/// Database and collection handles borrow the client, so it outlives them.
pub struct Client {
    transport: Box<dyn Transport>,
    settings: Settings,
    app_name: Option<String>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("settings", &self.settings)
            .field("app_name", &self.app_name)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// A client with server-default settings.
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self { transport: Box::new(transport), settings: Settings::default(), app_name: None }
    }

    /// # Errors
    /// `InvalidArgument` if the configured settings are structurally invalid.
    pub fn with_options(
        transport: impl Transport + 'static,
        options: ClientOptions,
    ) -> Result<Self, DbError> {
        options.validate()?;
        let settings = options.settings();
        Ok(Self { transport: Box::new(transport), settings, app_name: options.app_name })
    }

    /// Mints a handle for database `name`. No round-trip; the database does
    /// not need to exist yet.
    pub fn database(&self, name: &str) -> Database<'_> {
        Database::new(self, name)
    }

    #[must_use]
    pub fn app_name(&self) -> Option<&str> {
        self.app_name.as_deref()
    }

    #[must_use]
    pub fn settings(&self) -> Settings {
        self.settings.clone()
    }

    #[must_use]
    pub fn read_preference(&self) -> ReadPreference {
        self.settings.read_preference.clone()
    }

    /// Affects databases minted afterwards only.
    ///
    /// # Errors
    /// `InvalidArgument` if `rp` is structurally invalid.
    pub fn set_read_preference(&mut self, rp: ReadPreference) -> Result<(), DbError> {
        rp.validate()?;
        trace!("client read preference -> {}", rp.mode().as_str());
        self.settings.read_preference = rp;
        Ok(())
    }

    #[must_use]
    pub fn write_concern(&self) -> WriteConcern {
        self.settings.write_concern.clone()
    }

    /// Affects databases minted afterwards only.
    ///
    /// # Errors
    /// `InvalidArgument` if `wc` is structurally invalid.
    pub fn set_write_concern(&mut self, wc: WriteConcern) -> Result<(), DbError> {
        wc.validate()?;
        trace!("client write concern -> {:?}", wc);
        self.settings.write_concern = wc;
        Ok(())
    }

    /// Sends `command` to `database` and checks the reply.
    pub(crate) fn execute(
        &self,
        database: &str,
        command: &Document,
        read_preference: &ReadPreference,
    ) -> Result<Document, DbError> {
        debug!(
            target: "nexusgate::command",
            "{database}: {} (readPreference: {})",
            command_name(command).unwrap_or("<empty>"),
            read_preference.mode().as_str()
        );
        let reply = self.transport.execute(command, database, read_preference)?;
        Ok(check_reply(reply)?)
    }
}
