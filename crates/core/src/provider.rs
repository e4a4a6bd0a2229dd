//! Provider profiles.
//!
//! A provider is a doctor's bookable profile, distinct from the underlying
//! account. Profiles carry the medical specialization, consultation fee,
//! an administrative approval flag gating visibility to patients, and an
//! advertised weekly availability list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use medibook_types::TimeOfDay;

/// The fixed set of recognised medical specializations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Specialization {
    Cardiology,
    Dermatology,
    Endocrinology,
    Gastroenterology,
    #[serde(rename = "General Medicine")]
    GeneralMedicine,
    Neurology,
    Oncology,
    Orthopedics,
    Pediatrics,
    Psychiatry,
    Radiology,
    Surgery,
}

impl Specialization {
    pub const ALL: [Specialization; 12] = [
        Specialization::Cardiology,
        Specialization::Dermatology,
        Specialization::Endocrinology,
        Specialization::Gastroenterology,
        Specialization::GeneralMedicine,
        Specialization::Neurology,
        Specialization::Oncology,
        Specialization::Orthopedics,
        Specialization::Pediatrics,
        Specialization::Psychiatry,
        Specialization::Radiology,
        Specialization::Surgery,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Specialization::Cardiology => "Cardiology",
            Specialization::Dermatology => "Dermatology",
            Specialization::Endocrinology => "Endocrinology",
            Specialization::Gastroenterology => "Gastroenterology",
            Specialization::GeneralMedicine => "General Medicine",
            Specialization::Neurology => "Neurology",
            Specialization::Oncology => "Oncology",
            Specialization::Orthopedics => "Orthopedics",
            Specialization::Pediatrics => "Pediatrics",
            Specialization::Psychiatry => "Psychiatry",
            Specialization::Radiology => "Radiology",
            Specialization::Surgery => "Surgery",
        }
    }

    /// Parses the display form, e.g. `"General Medicine"`.
    pub fn parse(input: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.as_str() == input)
    }
}

impl std::fmt::Display for Specialization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Day of the week an availability window applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    pub fn as_str(&self) -> &'static str {
        match self {
            DayOfWeek::Monday => "Monday",
            DayOfWeek::Tuesday => "Tuesday",
            DayOfWeek::Wednesday => "Wednesday",
            DayOfWeek::Thursday => "Thursday",
            DayOfWeek::Friday => "Friday",
            DayOfWeek::Saturday => "Saturday",
            DayOfWeek::Sunday => "Sunday",
        }
    }

    /// Parses the display form, e.g. `"Monday"`.
    pub fn parse(input: &str) -> Option<Self> {
        match input {
            "Monday" => Some(DayOfWeek::Monday),
            "Tuesday" => Some(DayOfWeek::Tuesday),
            "Wednesday" => Some(DayOfWeek::Wednesday),
            "Thursday" => Some(DayOfWeek::Thursday),
            "Friday" => Some(DayOfWeek::Friday),
            "Saturday" => Some(DayOfWeek::Saturday),
            "Sunday" => Some(DayOfWeek::Sunday),
            _ => None,
        }
    }
}

impl std::fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single advertised availability window.
///
/// Windows are validated for shape (`start < end`) when a doctor replaces
/// their list; overlap between windows is deliberately accepted (see the
/// availability tests in `repositories::providers`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AvailabilitySlot {
    pub day: DayOfWeek,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    #[serde(default = "default_true")]
    pub is_available: bool,
}

fn default_true() -> bool {
    true
}

/// A stored provider profile document.
///
/// Linked one-to-one to a doctor [`crate::Account`] by `account_id`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Provider {
    pub id: Uuid,
    pub account_id: Uuid,
    pub specialization: Specialization,
    pub experience_years: i32,
    pub qualifications: String,
    pub consultation_fee: f64,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub profile_image: String,
    #[serde(default)]
    pub available_slots: Vec<AvailabilitySlot>,
    #[serde(default)]
    pub is_approved: bool,
    #[serde(default)]
    pub rating: f32,
    #[serde(default)]
    pub rating_count: u32,
    pub created_at: DateTime<Utc>,
}

impl Provider {
    /// The placeholder profile created alongside a doctor registration.
    ///
    /// Doctors register before submitting profile details, so the profile
    /// starts with neutral values and an unset approval flag.
    pub fn placeholder(account_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id,
            specialization: Specialization::GeneralMedicine,
            experience_years: 0,
            qualifications: "Not provided".into(),
            consultation_fee: 0.0,
            bio: String::new(),
            profile_image: String::new(),
            available_slots: Vec::new(),
            is_approved: false,
            rating: 0.0,
            rating_count: 0,
            created_at: Utc::now(),
        }
    }
}

/// Read model of a provider joined with its owning account.
///
/// `available_slots` is `None` in listings (matching the directory's
/// list-versus-detail split) and populated on single-provider reads.
#[derive(Clone, Debug, Serialize)]
pub struct ProviderView {
    pub id: Uuid,
    pub account_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub specialization: Specialization,
    pub experience_years: i32,
    pub qualifications: String,
    pub consultation_fee: f64,
    pub bio: String,
    pub profile_image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_slots: Option<Vec<AvailabilitySlot>>,
    pub is_approved: bool,
    pub rating: f32,
    pub rating_count: u32,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn specialization_round_trips_display_form() {
        for spec in Specialization::ALL {
            assert_eq!(Specialization::parse(spec.as_str()), Some(spec));
        }
        assert_eq!(Specialization::parse("Homeopathy"), None);
    }

    #[test]
    fn specialization_serde_uses_display_names() {
        let json = serde_json::to_string(&Specialization::GeneralMedicine).unwrap();
        assert_eq!(json, "\"General Medicine\"");

        let parsed: Specialization = serde_json::from_str("\"Cardiology\"").unwrap();
        assert_eq!(parsed, Specialization::Cardiology);
    }

    #[test]
    fn availability_slot_defaults_to_available() {
        let slot: AvailabilitySlot = serde_json::from_str(
            r#"{"day":"Monday","start_time":"09:00","end_time":"10:00"}"#,
        )
        .expect("slot should deserialize without is_available");
        assert!(slot.is_available);
    }

    #[test]
    fn placeholder_profile_is_unapproved_with_neutral_values() {
        let account_id = Uuid::new_v4();
        let profile = Provider::placeholder(account_id);

        assert_eq!(profile.account_id, account_id);
        assert_eq!(profile.specialization, Specialization::GeneralMedicine);
        assert_eq!(profile.experience_years, 0);
        assert_eq!(profile.qualifications, "Not provided");
        assert_eq!(profile.consultation_fee, 0.0);
        assert!(!profile.is_approved);
        assert!(profile.available_slots.is_empty());
    }
}
