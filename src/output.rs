//! The record returned to callers of `POST /predict-disease`.

use serde::Serialize;
use utoipa::ToSchema;

/// A normalised diagnosis for one leaf photo.
///
/// Only [`crate::pipeline::normalize::parse_diagnosis`] builds this from
/// model output. It has no `Default`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[schema(example = json!({
    "disease": "Early Blight",
    "cause": "Fungus Alternaria solani",
    "treatment": "Remove infected leaves and apply a copper fungicide"
}))]
pub struct DiagnosisResult {
    /// Disease name, or "Unknown" when the photo is not a leaf.
    #[schema(example = "Early Blight")]
    pub disease: String,
    /// What causes the disease.
    pub cause: String,
    /// Recommended treatment.
    pub treatment: String,
}
