pub const CHAT_SYSTEM: &str = include_str!("../data/prompts/chat_system.txt");
pub const HAIR_ANALYSIS: &str = include_str!("../data/prompts/hair_analysis.txt");
pub const HAIR_EDIT: &str = include_str!("../data/prompts/hair_edit.txt");
pub const VIDEO: &str = include_str!("../data/prompts/video.txt");
pub const BUSINESS_NAMES: &str = include_str!("../data/prompts/business_names.txt");

/// Text sent alongside an image when the user typed nothing.
pub const IMAGE_ONLY_CHAT: &str = "Analyze this image and answer any questions found within it.";

/// Replace `{{key}}` placeholders in a template string.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        result = result.replace(&format!("{{{{{}}}}}", key), value);
    }
    result
}
