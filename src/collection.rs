use crate::client::Client;
use crate::database::attach_write_concern;
use crate::errors::DbError;
use crate::settings::{ReadPreference, Settings, WriteConcern};
use crate::types::Namespace;
use bson::doc;

/// A handle to one collection, minted by a [`crate::Database`].
///
/// Carries its own copy of the settings the database had at mint time; the
/// two handles never share mutable state.
#[derive(Debug)]
pub struct Collection<'c> {
    client: &'c Client,
    database: String,
    name: String,
    settings: Settings,
}

impl<'c> Collection<'c> {
    pub(crate) fn new(client: &'c Client, database: &str, name: &str, settings: Settings) -> Self {
        Self { client, database: database.to_string(), name: name.to_string(), settings }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn database_name(&self) -> &str {
        &self.database
    }

    #[must_use]
    pub fn namespace(&self) -> Namespace {
        Namespace::new(self.database.clone(), self.name.clone())
    }

    #[must_use]
    pub fn settings(&self) -> Settings {
        self.settings.clone()
    }

    #[must_use]
    pub fn read_preference(&self) -> ReadPreference {
        self.settings.read_preference.clone()
    }

    /// # Errors
    /// `InvalidArgument` if `rp` is structurally invalid.
    pub fn set_read_preference(&mut self, rp: ReadPreference) -> Result<(), DbError> {
        rp.validate()?;
        self.settings.read_preference = rp;
        Ok(())
    }

    #[must_use]
    pub fn write_concern(&self) -> WriteConcern {
        self.settings.write_concern.clone()
    }

    /// # Errors
    /// `InvalidArgument` if `wc` is structurally invalid.
    pub fn set_write_concern(&mut self, wc: WriteConcern) -> Result<(), DbError> {
        wc.validate()?;
        self.settings.write_concern = wc;
        Ok(())
    }

    /// Drops this collection.
    ///
    /// # Errors
    /// Propagates command failures, including `NamespaceNotFound`.
    pub fn drop(&self) -> Result<(), DbError> {
        let mut command = doc! { "drop": self.name.as_str() };
        attach_write_concern(&mut command, &self.settings.write_concern);
        self.client.execute(&self.database, &command, &ReadPreference::primary())?;
        Ok(())
    }
}
