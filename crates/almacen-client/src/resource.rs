//! Typed CRUD over one backend collection

use crate::client::ApiClient;
use almacen_core::{Error, Id, Record, Result};
use serde_json::Value;
use std::marker::PhantomData;

/// CRUD client for the collection backing record type `T`
#[derive(Debug, Clone)]
pub struct ResourceClient<T> {
    client: ApiClient,
    marker: PhantomData<fn() -> T>,
}

impl ApiClient {
    /// Typed client for the collection of `T`
    #[must_use]
    pub fn resource<T: Record>(&self) -> ResourceClient<T> {
        ResourceClient {
            client: self.clone(),
            marker: PhantomData,
        }
    }
}

fn decode<T: Record>(value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| {
        Error::Other(format!("{} returned an unexpected record: {e}", T::KIND.path()))
    })
}

impl<T: Record> ResourceClient<T> {
    /// Every record of the collection
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or a row does not decode.
    pub async fn list(&self) -> Result<Vec<T>> {
        self.client
            .list(T::KIND)
            .await?
            .into_iter()
            .map(decode)
            .collect()
    }

    /// One record by id
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when the record does not exist.
    pub async fn get(&self, id: Id) -> Result<T> {
        decode(self.client.get(T::KIND, id).await?)
    }

    /// Validate and create a record
    ///
    /// When the backend answers without a body the submitted record is
    /// returned as is.
    ///
    /// # Errors
    ///
    /// Returns a validation error before any request is made, or the
    /// backend's error.
    pub async fn create(&self, record: &T) -> Result<T> {
        record.validate()?;
        let created = self
            .client
            .create(T::KIND, &serde_json::to_value(record)?)
            .await?;
        if created.is_null() {
            Ok(record.clone())
        } else {
            decode(created)
        }
    }

    /// Validate and replace a record by id
    ///
    /// # Errors
    ///
    /// Returns a validation error before any request is made, or the
    /// backend's error ([`Error::NotFound`] for a missing id).
    pub async fn update(&self, id: Id, record: &T) -> Result<T> {
        record.validate()?;
        let updated = self
            .client
            .update(T::KIND, id, &serde_json::to_value(record)?)
            .await?;
        if updated.is_null() {
            Ok(record.clone())
        } else {
            decode(updated)
        }
    }

    /// Delete a record by id
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for a missing id.
    pub async fn delete(&self, id: Id) -> Result<()> {
        self.client.delete(T::KIND, id).await
    }
}
