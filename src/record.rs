// WHY: Typed view of one stats file so a missing or mistyped field fails at decode time
// with serde's field path instead of surfacing later as a lookup error

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::PathBuf;

/// Range reduction applied before compression, as labelled by the compressor
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RangeReduction {
    None,
    Rotations,
    Translations,
    RotationsAndTranslations,
    /// Any label outside the known set; shortened to `RR:???`
    Unknown(String),
}

impl RangeReduction {
    /// Map a long-form label to its variant; unrecognised labels are kept as `Unknown`
    pub fn from_label(label: &str) -> Self {
        match label {
            "RangeReduction::None" => Self::None,
            "RangeReduction::Rotations" => Self::Rotations,
            "RangeReduction::Translations" => Self::Translations,
            "RangeReduction::Rotations | RangeReduction::Translations" => Self::RotationsAndTranslations,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Long-form label as written by the compressor
    pub fn label(&self) -> &str {
        match self {
            Self::None => "RangeReduction::None",
            Self::Rotations => "RangeReduction::Rotations",
            Self::Translations => "RangeReduction::Translations",
            Self::RotationsAndTranslations => "RangeReduction::Rotations | RangeReduction::Translations",
            Self::Unknown(label) => label,
        }
    }

    /// Short display code
    pub fn short(&self) -> &'static str {
        match self {
            Self::None => "RR:None",
            Self::Rotations => "RR:Rot",
            Self::Translations => "RR:Trans",
            Self::RotationsAndTranslations => "RR:Rot|Trans",
            Self::Unknown(_) => "RR:???",
        }
    }
}

impl fmt::Display for RangeReduction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short())
    }
}

impl<'de> Deserialize<'de> for RangeReduction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(Self::from_label(&label))
    }
}

impl Serialize for RangeReduction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Stable key of one compression configuration
///
/// The compressor writes it as a number; strings are accepted too.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct AlgorithmUid(pub String);

impl<'de> Deserialize<'de> for AlgorithmUid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Unsigned(u64),
            Signed(i64),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Unsigned(v) => Self(v.to_string()),
            Raw::Signed(v) => Self(v.to_string()),
            Raw::Text(v) => Self(v),
        })
    }
}

impl fmt::Display for AlgorithmUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Nested segmenting stage of a run
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SegmentingRecord {
    pub range_reduction: RangeReduction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_segments: Option<u64>,
}

/// One run entry of a stats file
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RunRecord {
    pub algorithm_uid: AlgorithmUid,
    pub algorithm_name: String,
    pub rotation_format: String,
    pub translation_format: String,
    pub range_reduction: RangeReduction,
    pub raw_size: u64,
    pub compressed_size: u64,
    pub compression_ratio: f64,
    /// Seconds
    pub compression_time: f64,
    /// Clip duration in seconds
    pub duration: f64,
    pub max_error: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_animated_tracks: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segmenting: Option<SegmentingRecord>,
}

impl RunRecord {
    /// Human-readable format summary
    ///
    /// `"{rotation}, {translation}, Clip {rr}"`, with `", Segment {rr}"` appended when the run
    /// has a segmenting stage.
    pub fn description(&self) -> String {
        match &self.segmenting {
            Some(segmenting) => format!(
                "{}, {}, Clip {}, Segment {}",
                self.rotation_format, self.translation_format, self.range_reduction, segmenting.range_reduction
            ),
            None => format!(
                "{}, {}, Clip {}",
                self.rotation_format, self.translation_format, self.range_reduction
            ),
        }
    }
}

/// Top-level layout of a stats file; other keys are ignored
#[derive(Debug, Clone, Deserialize)]
pub struct StatsFile {
    pub runs: Vec<RunRecord>,
}

/// A run annotated with its description and the stats file it came from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Run {
    #[serde(flatten)]
    pub record: RunRecord,
    pub description: String,
    pub filename: PathBuf,
}

impl Run {
    pub fn new(record: RunRecord, filename: impl Into<PathBuf>) -> Self {
        let description = record.description();
        Self {
            record,
            description,
            filename: filename.into(),
        }
    }
}
