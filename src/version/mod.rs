//! Strongly-typed application versions.
//!
//! App versions follow `major.minor.patch` with an optional `-kind.number`
//! prerelease segment (e.g. `1.2.3-beta.4`). Prerelease kinds are totally
//! ordered by maturity, and a version without a prerelease outranks any
//! prerelease at the same base. Parsing is strict: anything that does not
//! match the expected shape is an explicit error, never a silent fallback.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Prerelease maturity, ordered from least to most stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrereleaseKind {
    Canary,
    Alpha,
    Beta,
    Rc,
}

impl PrereleaseKind {
    /// Numeric rank used to compare release trains. A version with no
    /// prerelease ranks above every kind (see [`AppVersion::prerelease_rank`]).
    pub fn rank(self) -> u32 {
        match self {
            PrereleaseKind::Canary => 100,
            PrereleaseKind::Alpha => 200,
            PrereleaseKind::Beta => 300,
            PrereleaseKind::Rc => 400,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PrereleaseKind::Canary => "canary",
            PrereleaseKind::Alpha => "alpha",
            PrereleaseKind::Beta => "beta",
            PrereleaseKind::Rc => "rc",
        }
    }
}

impl FromStr for PrereleaseKind {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "canary" => Ok(PrereleaseKind::Canary),
            "alpha" => Ok(PrereleaseKind::Alpha),
            "beta" => Ok(PrereleaseKind::Beta),
            "rc" => Ok(PrereleaseKind::Rc),
            other => Err(VersionParseError::UnknownKind(other.to_string())),
        }
    }
}

impl fmt::Display for PrereleaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `kind.number` prerelease pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Prerelease {
    pub kind: PrereleaseKind,
    pub number: u32,
}

/// A parsed application version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AppVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub prerelease: Option<Prerelease>,
}

impl AppVersion {
    /// The `major.minor.patch` triple, prerelease stripped.
    pub fn base(&self) -> (u64, u64, u64) {
        (self.major, self.minor, self.patch)
    }

    /// Rank of the prerelease segment; an absent prerelease ranks above all
    /// kinds.
    pub fn prerelease_rank(&self) -> u32 {
        self.prerelease.map(|p| p.kind.rank()).unwrap_or(u32::MAX)
    }

    /// Support-window check used by the persisted query reconciler: the base
    /// must be at least the floor's base, and the prerelease rank at least
    /// the floor's rank. Both conditions apply globally, so a newer base on
    /// a less mature train than the floor's is still unsupported.
    pub fn is_supported(&self, floor: &AppVersion) -> bool {
        self.base() >= floor.base() && self.prerelease_rank() >= floor.prerelease_rank()
    }
}

impl Ord for AppVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let pre_key = |v: &AppVersion| {
            (
                v.prerelease_rank(),
                v.prerelease.map(|p| p.number).unwrap_or(0),
            )
        };
        self.base()
            .cmp(&other.base())
            .then_with(|| pre_key(self).cmp(&pre_key(other)))
    }
}

impl PartialOrd for AppVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for AppVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(pre) = self.prerelease {
            write!(f, "-{}.{}", pre.kind, pre.number)?;
        }
        Ok(())
    }
}

/// Error produced when a version string does not match the expected shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionParseError {
    Empty,
    BadBase(String),
    BadPrerelease(String),
    UnknownKind(String),
}

impl fmt::Display for VersionParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionParseError::Empty => write!(f, "empty version string"),
            VersionParseError::BadBase(s) => {
                write!(f, "invalid version base '{}', expected major.minor.patch", s)
            }
            VersionParseError::BadPrerelease(s) => {
                write!(f, "invalid prerelease segment '{}', expected kind.number", s)
            }
            VersionParseError::UnknownKind(s) => {
                write!(f, "unknown prerelease kind '{}'", s)
            }
        }
    }
}

impl std::error::Error for VersionParseError {}

impl FromStr for AppVersion {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(VersionParseError::Empty);
        }

        let (base, prerelease) = match s.split_once('-') {
            Some((base, pre)) => (base, Some(pre)),
            None => (s, None),
        };

        let mut parts = base.split('.');
        let mut next_num = || {
            parts
                .next()
                .and_then(|p| p.parse::<u64>().ok())
                .ok_or_else(|| VersionParseError::BadBase(base.to_string()))
        };
        let major = next_num()?;
        let minor = next_num()?;
        let patch = next_num()?;
        if parts.next().is_some() {
            return Err(VersionParseError::BadBase(base.to_string()));
        }

        let prerelease = prerelease
            .map(|pre| {
                let (kind, number) = pre
                    .split_once('.')
                    .ok_or_else(|| VersionParseError::BadPrerelease(pre.to_string()))?;
                let kind = kind.parse::<PrereleaseKind>()?;
                let number = number
                    .parse::<u32>()
                    .map_err(|_| VersionParseError::BadPrerelease(pre.to_string()))?;
                Ok(Prerelease { kind, number })
            })
            .transpose()?;

        Ok(AppVersion {
            major,
            minor,
            patch,
            prerelease,
        })
    }
}
