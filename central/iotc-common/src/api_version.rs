// Copyright (c) Microsoft. All rights reserved.

/// REST schema revisions understood by IoT Central, oldest first.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum ApiVersion {
    Preview,
    V1_0,
    V1_1Preview,
    V2022_05_31,
    V2022_06_30Preview,
    V2022_07_31,
}

impl ApiVersion {
    pub const ALL: [ApiVersion; 6] = [
        ApiVersion::Preview,
        ApiVersion::V1_0,
        ApiVersion::V1_1Preview,
        ApiVersion::V2022_05_31,
        ApiVersion::V2022_06_30Preview,
        ApiVersion::V2022_07_31,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ApiVersion::Preview => "preview",
            ApiVersion::V1_0 => "1.0",
            ApiVersion::V1_1Preview => "1.1-preview",
            ApiVersion::V2022_05_31 => "2022-05-31",
            ApiVersion::V2022_06_30Preview => "2022-06-30-preview",
            ApiVersion::V2022_07_31 => "2022-07-31",
        }
    }

    /// Scheduled jobs were introduced in 2022-06-30-preview.
    pub fn supports_scheduled_jobs(self) -> bool {
        self >= ApiVersion::V2022_06_30Preview
    }
}

impl std::fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ApiVersion {
    type Err = ParseApiVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ApiVersion::ALL
            .into_iter()
            .find(|version| version.as_str() == s)
            .ok_or_else(|| ParseApiVersionError(s.to_owned()))
    }
}

impl serde::Serialize for ApiVersion {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> serde::Deserialize<'de> for ApiVersion {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s: std::borrow::Cow<'de, str> = serde::Deserialize::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug)]
pub struct ParseApiVersionError(String);

impl std::fmt::Display for ParseApiVersionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unsupported API version {:?}; expected one of ", self.0)?;

        for (i, version) in ApiVersion::ALL.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(version.as_str())?;
        }

        Ok(())
    }
}

impl std::error::Error for ParseApiVersionError {}
