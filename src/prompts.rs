//! The instruction sent to the VLM with every leaf photo.
//!
//! Kept in one place so the wording can change without touching the
//! inference or parsing code, and so tests can check the contract the
//! response normalizer relies on (three named fields, JSON only).

/// Sentinel values the model must return when the photo is not a plant leaf.
pub const NOT_A_LEAF_DISEASE: &str = "Unknown";
pub const NOT_A_LEAF_CAUSE: &str = "Not a valid plant leaf";
pub const NOT_A_LEAF_TREATMENT: &str = "N/A";

/// Diagnosis prompt sent alongside the uploaded image.
pub const DIAGNOSIS_PROMPT: &str = r#"Analyze this image and determine if it shows a plant leaf or plant part.
If it's clearly a plant leaf, identify any disease present and provide detailed information.
If it's clearly not a plant leaf (human, animal, object, etc.), return the specific response for non-plant images.

IMPORTANT: You must respond with ONLY a valid JSON object. Do not include any other text, explanations, or markdown formatting.

The JSON object must contain exactly these three fields:
- "disease": The name of the disease (or "Unknown" if not a plant leaf)
- "cause": The cause of the disease (or "Not a valid plant leaf" if not a plant leaf)
- "treatment": Recommended treatment (or "N/A" if not a plant leaf)

Example format:
{"disease": "Leaf Spot", "cause": "Fungal infection", "treatment": "Apply fungicide"}

Be thorough in your analysis and provide specific, actionable information."#;
