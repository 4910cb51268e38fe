// Copyright (c) Microsoft. All rights reserved.

#[derive(Debug)]
pub enum Error {
    /// A settings file or drop-in could not be read or parsed. `None` means
    /// the merged settings did not match the expected schema.
    ReadConfig(
        Option<std::path::PathBuf>,
        Box<dyn std::error::Error + Send + Sync>,
    ),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::ReadConfig(Some(path), _) => {
                write!(f, "could not read settings from {}", path.display())
            }
            Error::ReadConfig(None, _) => f.write_str("merged settings are invalid"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::ReadConfig(_, err) => Some(&**err),
        }
    }
}
