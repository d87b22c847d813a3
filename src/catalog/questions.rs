//! Question templates and the standard catalog.
//!
//! A [`QuestionTemplate`] is what the seekers pick from; binding seeker input
//! to it produces a [`QuestionInstance`]. Bookkeeping (answer counts, timeout
//! checks) keys on the template id, so two instances of the same template
//! with different input count as the same question.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::config::schema::GameConfig;
use crate::error::GameError;

// ============================================================================
// Families and Identity
// ============================================================================

/// Question families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionFamily {
    /// "Is your closest X the same as mine?"
    Matching,
    /// "Are you closer to an X than me?"
    Measuring,
    /// "Are you within N km of us?"
    Radar,
    /// "We moved; are we warmer or colder?"
    Thermometer,
    /// "Which X within range of us are you closest to?"
    Tentacles,
    /// "Send a photo of X."
    Photo,
}

impl QuestionFamily {
    /// Every family in catalog order.
    pub const ALL: [Self; 6] = [
        Self::Matching,
        Self::Measuring,
        Self::Radar,
        Self::Thermometer,
        Self::Tentacles,
        Self::Photo,
    ];

    /// Lower-case name used in ids and on the command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Matching => "matching",
            Self::Measuring => "measuring",
            Self::Radar => "radar",
            Self::Thermometer => "thermometer",
            Self::Tentacles => "tentacles",
            Self::Photo => "photo",
        }
    }

    /// Cards drawn and kept when a question of this family is answered.
    #[must_use]
    pub const fn reward(self) -> Reward {
        match self {
            Self::Matching | Self::Measuring => Reward { draw: 3, keep: 1 },
            Self::Radar | Self::Thermometer => Reward { draw: 2, keep: 1 },
            Self::Tentacles => Reward { draw: 4, keep: 2 },
            Self::Photo => Reward { draw: 1, keep: 1 },
        }
    }

    fn answer_options(self) -> &'static [&'static str] {
        match self {
            Self::Matching => &["YES", "NO", "NULL"],
            Self::Measuring => &["CLOSER", "FURTHER", "NULL"],
            Self::Radar => &["HIT", "MISS", "NULL"],
            Self::Thermometer => &["WARMER", "COLDER", "NULL"],
            Self::Tentacles => &["OUT OF RANGE", "NULL"],
            Self::Photo => &["PHOTO SENT", "NULL"],
        }
    }
}

impl fmt::Display for QuestionFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|family| family.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!(
                    "unknown question family '{s}' (expected one of: {})",
                    Self::ALL.map(Self::as_str).join(", ")
                )
            })
    }
}

/// Stable template identifier of the form `family:subject-slug`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct QuestionId(String);

impl QuestionId {
    fn new(family: QuestionFamily, subject: &str) -> Self {
        Self(format!("{}:{}", family.as_str(), slug(subject)))
    }

    /// The id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn slug(subject: &str) -> String {
    let mut out = String::with_capacity(subject.len());
    for ch in subject.chars() {
        if ch.is_ascii_alphanumeric() || ch == '.' {
            out.push(ch.to_ascii_lowercase());
        } else if !out.ends_with('-') && !out.is_empty() {
            out.push('-');
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}

/// Cards drawn from the deck and cards the hider keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Reward {
    /// Cards drawn
    pub draw: usize,
    /// Cards kept
    pub keep: usize,
}

// ============================================================================
// Templates and Instances
// ============================================================================

/// An askable question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionTemplate {
    /// Stable identifier
    pub id: QuestionId,
    /// Family the question belongs to
    pub family: QuestionFamily,
    /// Place type, distance or photo subject
    pub subject: String,
    /// Seconds the hider has to answer
    pub allocated_time: i64,
    /// Reward granted to the hider on answer
    pub reward: Reward,
    /// Question text without seeker input
    pub prompt: String,
}

impl QuestionTemplate {
    fn new(
        family: QuestionFamily,
        subject: &str,
        allocated_time: i64,
        tentacles_km: u32,
    ) -> Self {
        let prompt = match family {
            QuestionFamily::Matching => format!("Is your closest {subject} the same as mine?"),
            QuestionFamily::Measuring => {
                format!("Are you closer to a {subject} compared to me?")
            }
            QuestionFamily::Radar => format!("Are you within {subject} of the seekers?"),
            QuestionFamily::Thermometer => {
                format!("After travelling {subject} am I warmer or colder?")
            }
            QuestionFamily::Tentacles => format!(
                "Which {subject} within {tentacles_km}km of me are you closest to? \
                 (Fails if hider is further than {tentacles_km}km.)"
            ),
            QuestionFamily::Photo => format!("Send a photo of {subject}."),
        };
        Self {
            id: QuestionId::new(family, subject),
            family,
            subject: subject.to_string(),
            allocated_time,
            reward: family.reward(),
            prompt,
        }
    }

    /// Validates `input` for this template's family and binds it.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidQuestionInput`] when the input does not
    /// fit the family: radar and photo take none, thermometer takes exactly
    /// two comma-separated places, tentacles takes a non-empty comma list and
    /// measuring takes an optional distance in km.
    pub fn bind(&self, input: &str) -> Result<QuestionInstance, GameError> {
        let input = input.trim();
        let invalid = |message: &str| GameError::InvalidQuestionInput {
            question: self.id.to_string(),
            message: message.to_string(),
        };

        let parts: Vec<String> = match self.family {
            QuestionFamily::Radar | QuestionFamily::Photo => {
                if !input.is_empty() {
                    return Err(invalid("this question takes no input"));
                }
                Vec::new()
            }
            QuestionFamily::Thermometer => {
                let places = split_list(input);
                if places.len() != 2 {
                    return Err(invalid(
                        "expected exactly two places separated by a comma (from, to)",
                    ));
                }
                places
            }
            QuestionFamily::Tentacles => {
                let candidates = split_list(input);
                if candidates.is_empty() {
                    return Err(invalid("expected a comma-separated list of candidates"));
                }
                candidates
            }
            QuestionFamily::Measuring => {
                if input.is_empty() {
                    Vec::new()
                } else {
                    match input.trim_end_matches("km").trim().parse::<f64>() {
                        Ok(km) if km > 0.0 && km.is_finite() => vec![input.to_string()],
                        _ => return Err(invalid("expected a positive distance in km")),
                    }
                }
            }
            QuestionFamily::Matching => {
                if input.is_empty() {
                    Vec::new()
                } else {
                    vec![input.to_string()]
                }
            }
        };

        Ok(QuestionInstance {
            template: self.clone(),
            input: parts,
        })
    }
}

fn split_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// A template bound to seeker input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionInstance {
    /// The question asked
    pub template: QuestionTemplate,
    /// Seeker-supplied input, split per family
    pub input: Vec<String>,
}

impl QuestionInstance {
    /// Template id used for bookkeeping.
    #[must_use]
    pub const fn id(&self) -> &QuestionId {
        &self.template.id
    }

    /// Seconds the hider has to answer.
    #[must_use]
    pub const fn allocated_time(&self) -> i64 {
        self.template.allocated_time
    }

    /// Reward for answering.
    #[must_use]
    pub const fn reward(&self) -> Reward {
        self.template.reward
    }

    /// Full question text including seeker input.
    #[must_use]
    pub fn text(&self) -> String {
        let t = &self.template;
        match (t.family, self.input.as_slice()) {
            (QuestionFamily::Matching, [place]) => {
                format!("Is {place} your closest {}? ({})", t.subject, t.prompt)
            }
            (QuestionFamily::Measuring, [km]) => format!(
                "Is your closest {} closer than {}km? ({})",
                t.subject,
                km.trim_end_matches("km").trim(),
                t.prompt
            ),
            (QuestionFamily::Thermometer, [from, to]) => format!(
                "The seekers have moved from {from} to {to}. Are they warmer or colder? ({})",
                t.prompt
            ),
            (QuestionFamily::Tentacles, candidates) if !candidates.is_empty() => {
                format!("{} Candidates: {}", t.prompt, candidates.join(", "))
            }
            _ => t.prompt.clone(),
        }
    }

    /// Answers the hider may give.
    #[must_use]
    pub fn options(&self) -> Vec<String> {
        let mut options: Vec<String> = self
            .template
            .family
            .answer_options()
            .iter()
            .map(ToString::to_string)
            .collect();
        if self.template.family == QuestionFamily::Tentacles {
            options.extend(self.input.iter().cloned());
        }
        options
    }
}

impl fmt::Display for QuestionInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

// ============================================================================
// Catalog
// ============================================================================

const MATCHING: &[&str] = &[
    "Commercial Airport",
    "Transit Line",
    "Station Name Length",
    "Local Council Area",
    "Suburb",
    "Park",
    "Amusement Park",
    "Zoo",
    "Aquarium",
    "Golf Course",
    "Museum",
    "Movie Theatre",
    "Hospital",
    "Library",
    "Foreign Consulate",
];

const MEASURING: &[&str] = &[
    "Commercial Airport",
    "Rail Station",
    "Local Council Border",
    "Suburb Border",
    "Body of Water",
    "Coastline",
    "Park",
    "Amusement Park",
    "Zoo",
    "Aquarium",
    "Golf Course",
    "Museum",
    "Movie Theatre",
    "Hospital",
    "Library",
    "Foreign Consulate",
];

const RADAR_KM: &[f64] = &[0.5, 1.0, 2.0, 5.0, 10.0, 15.0, 40.0, 80.0, 160.0];

const THERMOMETER_KM: &[f64] = &[1.0, 5.0, 15.0];

const TENTACLES: &[&str] = &["Museums", "Libraries", "Movie Theatres", "Hospitals"];

const PHOTO: &[&str] = &[
    "a tree",
    "the sky",
    "you",
    "the widest street",
    "the tallest structure in your sightline",
    "any building visible from the station",
    "the tallest building visible from the station",
    "a trace of the nearest path or street",
    "two buildings",
    "a restaurant interior",
    "a park",
    "a grocery store aisle",
];

/// Read-only registry of every askable question.
#[derive(Debug, Clone)]
pub struct QuestionCatalog {
    templates: Vec<QuestionTemplate>,
}

impl QuestionCatalog {
    /// Builds the standard catalog using the configured answer times and
    /// tentacles distance.
    #[must_use]
    pub fn standard(config: &GameConfig) -> Self {
        let question_time = config.timing.allocated_question_time;
        let photo_time = config.timing.allocated_photo_time;
        let tentacles_km = config.questions.tentacles_distance_km;
        let make = |family, subject: &str, time| {
            QuestionTemplate::new(family, subject, time, tentacles_km)
        };

        let mut templates = Vec::new();
        templates.extend(
            MATCHING
                .iter()
                .map(|s| make(QuestionFamily::Matching, s, question_time)),
        );
        templates.extend(
            MEASURING
                .iter()
                .map(|s| make(QuestionFamily::Measuring, s, question_time)),
        );
        templates.extend(
            RADAR_KM
                .iter()
                .map(|km| make(QuestionFamily::Radar, &format!("{km}km"), question_time)),
        );
        templates.extend(THERMOMETER_KM.iter().map(|km| {
            make(
                QuestionFamily::Thermometer,
                &format!("{km}km"),
                question_time,
            )
        }));
        templates.extend(
            TENTACLES
                .iter()
                .map(|s| make(QuestionFamily::Tentacles, s, question_time)),
        );
        templates.extend(
            PHOTO
                .iter()
                .map(|s| make(QuestionFamily::Photo, s, photo_time)),
        );

        Self { templates }
    }

    /// All templates in catalog order.
    #[must_use]
    pub fn all(&self) -> &[QuestionTemplate] {
        &self.templates
    }

    /// Templates of one family.
    pub fn by_family(&self, family: QuestionFamily) -> impl Iterator<Item = &QuestionTemplate> {
        self.templates.iter().filter(move |t| t.family == family)
    }

    /// Looks up a template by id (case-insensitive).
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&QuestionTemplate> {
        let id = id.trim();
        self.templates
            .iter()
            .find(|t| t.id.as_str().eq_ignore_ascii_case(id))
    }

    /// Suggests the closest id for a mistyped one.
    #[must_use]
    pub fn suggest(&self, input: &str) -> Option<String> {
        let input = input.trim().to_ascii_lowercase();
        self.templates
            .iter()
            .map(|t| (t.id.as_str(), strsim::damerau_levenshtein(&input, t.id.as_str())))
            .filter(|(_, dist)| *dist <= 3)
            .min_by_key(|(_, dist)| *dist)
            .map(|(id, _)| id.to_string())
    }

    /// Resolves `id` and binds `input` to it.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnknownQuestion`] (with a suggestion when one is
    /// close) or [`GameError::InvalidQuestionInput`].
    pub fn bind(&self, id: &str, input: &str) -> Result<QuestionInstance, GameError> {
        let template = self.find(id).ok_or_else(|| GameError::UnknownQuestion {
            id: id.to_string(),
            suggestion: self.suggest(id),
        })?;
        template.bind(input)
    }

    /// Number of templates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Returns `true` if the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
