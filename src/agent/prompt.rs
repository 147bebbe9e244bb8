//! System-message assembly: a persona template rendered by simple
//! `{{field}}` placeholder substitution, with no templating engine
//! dependency (`SPEC_FULL.md` §4.5).

use std::collections::HashMap;

use super::persona::PersonaConfiguration;

pub const DEFAULT_PERSONA_TEMPLATE: &str = "\
You are {{name}}, a simulated person.

## Persona
- Age: {{age}}
- Nationality: {{nationality}}
- Occupation: {{occupation_title}} — {{occupation_description}}
- Personality traits: {{personality_traits}}
- Professional interests: {{professional_interests}}
- Personal interests: {{personal_interests}}
- Skills: {{skills}}

## Current state
- Location: {{current_location}}
- Context: {{current_context}}
- Goals: {{current_goals}}
- Attention: {{current_attention}}
- Emotions: {{current_emotions}}
- Accessible agents: {{currently_accessible_agents}}

## Available actions
You may act only via a single JSON object per turn with the shape
`{\"action\": {\"type\": ..., \"content\": ..., \"target\": ...}, \"cognitive_state\": {...}}`.

The following action kinds are always available: DONE, TALK, THINK, REACH_OUT.
{{action_definitions}}

## Constraints
{{action_constraints}}
";

fn join_list(items: &[String]) -> String {
    if items.is_empty() {
        "(none)".to_string()
    } else {
        items.join(", ")
    }
}

/// Builds the substitution table for one render pass. Values are derived
/// fresh from `persona` every call; the caller decides whether a fresh
/// render is actually needed (see the memoized counters on `Agent`).
pub fn build_vars(persona: &PersonaConfiguration) -> HashMap<&'static str, String> {
    let mut vars = HashMap::new();
    vars.insert("name", persona.name.clone());
    vars.insert(
        "age",
        persona.age.map(|a| a.to_string()).unwrap_or_else(|| "unspecified".to_string()),
    );
    vars.insert(
        "nationality",
        persona.nationality.clone().unwrap_or_else(|| "unspecified".to_string()),
    );
    vars.insert(
        "occupation_title",
        persona.occupation_title.clone().unwrap_or_else(|| "unspecified".to_string()),
    );
    vars.insert(
        "occupation_description",
        persona
            .occupation_description
            .clone()
            .unwrap_or_else(|| "unspecified".to_string()),
    );
    vars.insert("personality_traits", join_list(&persona.personality_traits));
    vars.insert("professional_interests", join_list(&persona.professional_interests));
    vars.insert("personal_interests", join_list(&persona.personal_interests));
    vars.insert("skills", join_list(&persona.skills));
    vars.insert(
        "current_location",
        persona.current_location.clone().unwrap_or_else(|| "unspecified".to_string()),
    );
    vars.insert("current_context", join_list(&persona.current_context));
    vars.insert("current_goals", persona.current_goals.clone());
    vars.insert("current_attention", persona.current_attention.clone());
    vars.insert("current_emotions", persona.current_emotions.clone());
    vars.insert(
        "currently_accessible_agents",
        if persona.currently_accessible_agents.is_empty() {
            "(none)".to_string()
        } else {
            persona
                .currently_accessible_agents
                .iter()
                .map(|a| format!("{} ({})", a.name, a.relation_description))
                .collect::<Vec<_>>()
                .join("; ")
        },
    );
    vars
}

/// Substitutes every `{{key}}` token present in `vars`; any placeholder
/// without a corresponding key is left verbatim (a template bug, not a
/// runtime error).
pub fn render(template: &str, vars: &HashMap<&'static str, String>, extra: &HashMap<&'static str, String>) -> String {
    let mut rendered = template.to_string();
    for (key, value) in vars.iter().chain(extra.iter()) {
        rendered = rendered.replace(&format!("{{{{{key}}}}}"), value);
    }
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_known_placeholders() {
        let mut persona = PersonaConfiguration::new("Oscar");
        persona.age = Some(19);
        persona.current_goals = "Pass the interview".to_string();

        let vars = build_vars(&persona);
        let mut extra = HashMap::new();
        extra.insert("action_definitions", String::new());
        extra.insert("action_constraints", String::new());

        let rendered = render(DEFAULT_PERSONA_TEMPLATE, &vars, &extra);
        assert!(rendered.contains("You are Oscar"));
        assert!(rendered.contains("Age: 19"));
        assert!(rendered.contains("Pass the interview"));
    }
}
