use std::convert::Infallible;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::RwLock;
use tracing::debug;

use crate::errors::Error;
use crate::token::RefreshablePair;

/// Durable home of the token pair. The session never caches a pair itself;
/// whatever `restore` returns is the source of truth.
#[async_trait]
pub trait Storage: Send + Sync + 'static {
    type Pair: RefreshablePair;
    type Error: std::error::Error + Send + Sync + 'static;

    async fn store(&self, pair: &Self::Pair) -> Result<(), Self::Error>;

    /// Returns `Ok(None)` when nothing has ever been stored.
    async fn restore(&self) -> Result<Option<Self::Pair>, Self::Error>;
}

/// Process-local storage, mostly useful for tests and short-lived tools.
pub struct MemoryStorage<P> {
    slot: RwLock<Option<P>>,
}

impl<P> MemoryStorage<P> {
    pub fn new() -> Self {
        Self {
            slot: RwLock::new(None),
        }
    }

    pub fn with_pair(pair: P) -> Self {
        Self {
            slot: RwLock::new(Some(pair)),
        }
    }
}

impl<P> Default for MemoryStorage<P> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<P: RefreshablePair> Storage for MemoryStorage<P> {
    type Pair = P;
    type Error = Infallible;

    async fn store(&self, pair: &P) -> Result<(), Infallible> {
        *self.slot.write().await = Some(pair.clone());
        Ok(())
    }

    async fn restore(&self) -> Result<Option<P>, Infallible> {
        Ok(self.slot.read().await.clone())
    }
}

/// Persists the pair as a JSON document. Writes land in a sibling temp file
/// first and are renamed into place, so readers never see a partial document.
pub struct JsonFileStorage<P> {
    path: PathBuf,
    _marker: PhantomData<fn() -> P>,
}

impl<P> JsonFileStorage<P> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "session".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl<P> Storage for JsonFileStorage<P>
where
    P: RefreshablePair + Serialize + DeserializeOwned,
{
    type Pair = P;
    type Error = Error;

    async fn store(&self, pair: &P) -> Result<(), Error> {
        let contents = serde_json::to_vec_pretty(pair)?;
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        let staging = self.staging_path();
        tokio::fs::write(&staging, contents).await?;
        tokio::fs::rename(&staging, &self.path).await?;
        debug!(path = %self.path.display(), "storage.stored");
        Ok(())
    }

    async fn restore(&self) -> Result<Option<P>, Error> {
        let contents = match tokio::fs::read(&self.path).await {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let pair = serde_json::from_slice(&contents)?;
        Ok(Some(pair))
    }
}
