use anyhow::anyhow;
use std::{error::Error, fmt::Display};

use crate::AnyResult;

/// Converts foreign results and options into [`AnyResult`], attaching a human readable message.
pub trait AnyhowResultExt<T> {
    fn otherwise(self, s: impl Display) -> AnyResult<T>;

    /// Same as [`AnyhowResultExt::otherwise`], but the message is only built on failure.
    fn otherwise_with<D: Display>(self, f: impl FnOnce() -> D) -> AnyResult<T>;
}

impl<T, E: Error + Send + Sync + 'static> AnyhowResultExt<T> for Result<T, E> {
    fn otherwise(self, s: impl Display) -> AnyResult<T> {
        self.otherwise_with(|| s)
    }

    fn otherwise_with<D: Display>(self, f: impl FnOnce() -> D) -> AnyResult<T> {
        self.map_err(|e| anyhow::Error::from(e).context(f().to_string()))
    }
}

impl<T> AnyhowResultExt<T> for Option<T> {
    fn otherwise(self, s: impl Display) -> AnyResult<T> {
        self.otherwise_with(|| s)
    }

    fn otherwise_with<D: Display>(self, f: impl FnOnce() -> D) -> AnyResult<T> {
        match self {
            Some(v) => Ok(v),
            None => Err(anyhow!("{}", f())),
        }
    }
}
