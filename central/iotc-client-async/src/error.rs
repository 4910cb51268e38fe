// Copyright (c) Microsoft. All rights reserved.

#[derive(Debug)]
pub enum Error {
    /// The request could not be sent or no response arrived.
    Request(std::io::Error),

    /// IoT Central answered with an error.
    Api {
        status: hyper::StatusCode,
        code: Option<String>,
        message: String,
        request_id: Option<String>,
    },

    /// The response did not have the expected shape.
    MalformedResponse(String),

    InvalidParameter(&'static str, Box<dyn std::error::Error + Send + Sync>),

    /// No authorization header could be obtained from the credential.
    Credential(std::io::Error),
}

impl Error {
    pub(crate) fn invalid_parameter<E>(name: &'static str, err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Error::InvalidParameter(name, err.into())
    }

    pub(crate) fn malformed(err: impl std::fmt::Display) -> Self {
        Error::MalformedResponse(err.to_string())
    }

    /// HTTP status of an API error.
    pub fn status(&self) -> Option<hyper::StatusCode> {
        match self {
            Error::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Request(_) => f.write_str("could not complete request to IoT Central"),

            Error::Api {
                status,
                code,
                message,
                request_id,
            } => {
                write!(f, "IoT Central returned {}", status)?;
                if let Some(code) = code {
                    write!(f, " ({})", code)?;
                }
                write!(f, ": {}", message)?;
                if let Some(request_id) = request_id {
                    write!(f, " [request id {}]", request_id)?;
                }

                Ok(())
            }

            Error::MalformedResponse(message) => {
                write!(f, "malformed response from IoT Central: {}", message)
            }

            Error::InvalidParameter(name, _) => {
                write!(f, "parameter {:?} has an invalid value", name)
            }

            Error::Credential(_) => f.write_str("could not obtain an authorization token"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Request(err) | Error::Credential(err) => Some(err),
            Error::InvalidParameter(_, err) => Some(&**err),
            Error::Api { .. } | Error::MalformedResponse(_) => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Request(err)
    }
}
