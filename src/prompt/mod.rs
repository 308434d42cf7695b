use crate::profile::FarmProfile;

/// How many crops the model is asked for, spelled out. The fixed text of
/// the suggestion prompt carries no digits, so a whole-number land size
/// appears exactly once.
pub const SUGGESTION_COUNT: &str = "three";

fn suggestion_schema() -> &'static str {
r#"[{
  "name": "Crop Name",
  "confidence": "whole number between zero and one hundred",
  "waterNeeds": "Low|Medium|High",
  "sunlight": "Full Sun|Partial Shade|Full Shade",
  "temperature": "Temperature range in F",
  "description": "Why this crop suits the farm, in simple words",
  "organicGuide": {
    "preparation": ["First simple step", "Second simple step", "Third simple step"],
    "planting": ["First simple step", "Second simple step", "Third simple step"],
    "maintenance": ["First simple step", "Second simple step", "Third simple step"],
    "harvesting": ["First simple step", "Second simple step", "Third simple step"]
  }
}]"#
}

fn advisor_persona() -> &'static str {
r#"You are a friendly Indian farming expert who explains organic farming in simple, clear language.

When answering:
1. Greet the farmer with "Namaste! 🙏"
2. Replace difficult farming terms with everyday words
3. Keep sentences short
4. Use examples an Indian farmer will recognise
5. Recommend organic methods only, never chemicals
6. Finish with a small tip or a word of encouragement

If a photo is attached, look at it for:
1. Plant health problems
2. Signs of disease
3. Pest damage
4. Poor growth
and then suggest organic remedies.

If the farmer describes a problem:
1. Explain the problem simply
2. Give 2-3 easy organic solutions
3. Explain how to prevent it next season
4. Suggest materials available locally
5. Share one piece of traditional farming wisdom if it fits

Structure every reply like this:
- Problem (if any): [simple explanation]
- Solution steps: [numbered list]
- Prevention: [bullet points]
- Quick tip: [one practical advice]"#
}

fn profile_lines(out: &mut String, p: &FarmProfile, water_label: &str) {
    out.push_str("- Soil Type: ");
    out.push_str(p.soil_type.as_str());
    out.push_str("\n- Land Size: ");
    out.push_str(&p.land_size.to_string());
    out.push_str(" acres\n- Location: ");
    out.push_str(&p.location);
    out.push_str("\n- ");
    out.push_str(water_label);
    out.push_str(": ");
    out.push_str(p.water_availability.as_str());
    out.push_str("\n- Previous Crops: ");
    out.push_str(&p.previous_crops);
    if let Some(issues) = p.current_issues() {
        out.push_str("\n- Current Problems: ");
        out.push_str(issues);
    }
    out.push('\n');
}

/// Ask for crop suggestions as a bare JSON array, shaped like
/// [`crate::wire::CropSuggestion`].
pub fn build_suggestion_prompt(profile: &FarmProfile) -> String {
    let mut out = String::with_capacity(1536);
    out.push_str(&format!(
        "As an Indian farming expert, suggest the {SUGGESTION_COUNT} best crops to grow on this farm. \
Use simple language. Respond ONLY with a JSON array of objects with exactly this structure, no other text:\n"
    ));
    out.push_str(suggestion_schema());
    out.push_str(
        "\n\nEvery list inside \"organicGuide\" must be an array of strings. \
\"confidence\" must be a bare whole number between zero and one hundred, not a string.\n\nFarm data:\n",
    );
    profile_lines(&mut out, profile, "Water Availability");
    out
}

/// Free-form advice. Works without a profile; a profile, when given,
/// personalizes the answer.
pub fn build_chat_prompt(
    question: &str,
    profile: Option<&FarmProfile>,
    image_ref: Option<&str>,
) -> String {
    let mut out = String::with_capacity(2048);
    out.push_str(advisor_persona());
    out.push_str("\n\nUser question: ");
    out.push_str(question);
    out.push('\n');
    if let Some(img) = image_ref.filter(|s| !s.is_empty()) {
        out.push_str("Image URL: ");
        out.push_str(img);
        out.push('\n');
    }

    if let Some(p) = profile {
        out.push_str("\nFarmer's details:\n");
        profile_lines(&mut out, p, "Water Available");
        out.push_str("\nUse this information to give personalized advice.\n");
    }

    out.push_str("\nRemember to use simple Indian English and give practical solutions that farmers can easily follow.");
    out
}
