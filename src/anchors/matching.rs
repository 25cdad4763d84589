// Copyright Catenary Transit Initiatives
// Authored-template lookup.
//
// Template names are free text typed in the anchor lab ("FASE A1 VANTE C1",
// "PARA-RAIO OPGW RE", ...). A conductor is matched against them with an
// ordered list of rules; the first rule that hits any template wins, and
// within a rule the first template in list order wins.

use crate::models::{AnchorTemplate, ConductorConfig};

/// Which side of the structure the cable leaves from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorRole {
    /// Forward attachment ("vante"), used at the start tower of a span.
    Lead,
    /// Backward attachment ("ré"), used at the end tower of a span.
    Trail,
}

impl AnchorRole {
    pub fn tokens(&self) -> &'static [&'static str] {
        match self {
            AnchorRole::Lead => &["VANTE", "LEAD"],
            AnchorRole::Trail => &["RE", "RÉ", "TRAIL"],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MatchRule {
    /// Template name equals the conductor's explicit anchor name.
    ExplicitName,
    /// Phase/id/label substring, circuit, and a role token.
    PhaseCircuitRole(AnchorRole),
    /// Phase/id/label substring and circuit, any role.
    PhaseCircuit,
    /// Template name equals the conductor id, label or phase.
    ExactName,
}

#[derive(Clone, Copy, Debug)]
pub struct TemplateMatch<'a> {
    pub template: &'a AnchorTemplate,
    pub rule: MatchRule,
    /// Templates the winning rule accepted; > 1 means the authoring is ambiguous.
    pub candidates: usize,
}

/// Rules in priority order for a role. The trail side also accepts lead
/// anchors, since most models only author the forward set.
pub fn match_rules(role: AnchorRole) -> Vec<MatchRule> {
    let mut rules = vec![MatchRule::ExplicitName, MatchRule::PhaseCircuitRole(role)];
    if role == AnchorRole::Trail {
        rules.push(MatchRule::PhaseCircuitRole(AnchorRole::Lead));
    }
    rules.push(MatchRule::PhaseCircuit);
    rules.push(MatchRule::ExactName);
    rules
}

fn has_token(name: &str, tokens: &[&str]) -> bool {
    name.split(|c: char| !c.is_alphanumeric())
        .any(|t| tokens.contains(&t))
}

fn conductor_keys(conductor: &ConductorConfig) -> Vec<String> {
    [
        Some(conductor.id.as_str()),
        Some(conductor.label.as_str()),
        conductor.phase.as_deref(),
    ]
    .into_iter()
    .flatten()
    .filter(|s| !s.trim().is_empty())
    .map(str::to_uppercase)
    .collect()
}

fn phase_and_circuit(name: &str, conductor: &ConductorConfig) -> bool {
    let phase_match = conductor_keys(conductor)
        .iter()
        .any(|k| name.contains(k.as_str()));
    let circuit_match = match conductor.circuit_id.as_deref() {
        Some(c) if !c.is_empty() => name.contains(&c.to_uppercase()),
        _ => true,
    };
    phase_match && circuit_match
}

impl MatchRule {
    pub fn matches(&self, conductor: &ConductorConfig, template: &AnchorTemplate) -> bool {
        let name = template.name.to_uppercase();
        if *self != MatchRule::ExplicitName && template.is_base() {
            return false;
        }
        match self {
            MatchRule::ExplicitName => conductor
                .manual_anchor_name
                .as_deref()
                .is_some_and(|manual| name == manual.trim().to_uppercase()),
            MatchRule::PhaseCircuitRole(role) => {
                phase_and_circuit(&name, conductor) && has_token(&name, role.tokens())
            }
            MatchRule::PhaseCircuit => phase_and_circuit(&name, conductor),
            MatchRule::ExactName => conductor_keys(conductor).iter().any(|k| *k == name),
        }
    }
}

/// First template accepted by the highest-priority rule.
pub fn find_template<'a, I>(
    templates: I,
    conductor: &ConductorConfig,
    role: AnchorRole,
) -> Option<TemplateMatch<'a>>
where
    I: IntoIterator<Item = &'a AnchorTemplate> + Copy,
{
    match_rules(role).into_iter().find_map(|rule| {
        let mut hits = templates
            .into_iter()
            .filter(|t| rule.matches(conductor, t));
        let first = hits.next()?;
        Some(TemplateMatch {
            template: first,
            rule,
            candidates: 1 + hits.count(),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math3d::Vec3;

    fn tpl(name: &str) -> AnchorTemplate {
        AnchorTemplate::new(name, Vec3::ZERO)
    }

    fn phase_a1() -> ConductorConfig {
        ConductorConfig::new("FA-1", "Fase A1", Some("FASE A"), -9.0, 0.85, 0.15)
    }

    #[test]
    fn test_explicit_name_wins_over_phase_match() {
        let templates = vec![tpl("FASE A1 VANTE"), tpl("Custom Hook 7")];
        let mut c = phase_a1();
        c.manual_anchor_name = Some("custom hook 7".to_string());
        let m = find_template(&templates, &c, AnchorRole::Lead).unwrap();
        assert_eq!(m.template.name, "Custom Hook 7");
        assert_eq!(m.rule, MatchRule::ExplicitName);
    }

    #[test]
    fn test_role_token_selects_side() {
        let templates = vec![tpl("FASE A1 VANTE"), tpl("FASE A1 RE")];
        let c = phase_a1();
        let lead = find_template(&templates, &c, AnchorRole::Lead).unwrap();
        let trail = find_template(&templates, &c, AnchorRole::Trail).unwrap();
        assert_eq!(lead.template.name, "FASE A1 VANTE");
        assert_eq!(trail.template.name, "FASE A1 RE");
    }

    #[test]
    fn test_trail_falls_back_to_lead_anchor() {
        let templates = vec![tpl("FASE A1 VANTE")];
        let m = find_template(&templates, &phase_a1(), AnchorRole::Trail).unwrap();
        assert_eq!(m.rule, MatchRule::PhaseCircuitRole(AnchorRole::Lead));
    }

    #[test]
    fn test_role_token_is_a_whole_word() {
        // "FRENTE" contains "RE" but is not the trail token.
        let templates = vec![tpl("FASE A1 FRENTE")];
        let m = find_template(&templates, &phase_a1(), AnchorRole::Trail).unwrap();
        assert_eq!(m.rule, MatchRule::PhaseCircuit);
    }

    #[test]
    fn test_circuit_must_match_when_configured() {
        let templates = vec![tpl("FASE A1 VANTE C2"), tpl("FASE A1 VANTE C1")];
        let mut c = phase_a1();
        c.circuit_id = Some("c1".to_string());
        let m = find_template(&templates, &c, AnchorRole::Lead).unwrap();
        assert_eq!(m.template.name, "FASE A1 VANTE C1");
    }

    #[test]
    fn test_base_templates_never_match_conductors() {
        let templates = vec![tpl("BASE FASE A")];
        assert!(find_template(&templates, &phase_a1(), AnchorRole::Lead).is_none());
    }

    #[test]
    fn test_exact_name_fallback() {
        // The circuit tag is missing from the authored name, so only the
        // exact-name rule can pick it up.
        let templates = vec![tpl("X1"), tpl("gw")];
        let mut c = ConductorConfig::new("GW", "Ground", None, 0.0, 1.0, 0.0);
        c.circuit_id = Some("C1".to_string());
        let m = find_template(&templates, &c, AnchorRole::Lead).unwrap();
        assert_eq!(m.template.name, "gw");
        assert_eq!(m.rule, MatchRule::ExactName);
    }

    #[test]
    fn test_ambiguity_is_reported_and_first_wins() {
        let templates = vec![tpl("FASE A VANTE 1"), tpl("FASE A VANTE 2")];
        let c = ConductorConfig::new("FA", "A", Some("FASE A"), 0.0, 0.85, 0.0);
        let m = find_template(&templates, &c, AnchorRole::Lead).unwrap();
        assert_eq!(m.template.name, "FASE A VANTE 1");
        assert_eq!(m.candidates, 2);
    }

    #[test]
    fn test_rule_order() {
        assert_eq!(
            match_rules(AnchorRole::Trail),
            vec![
                MatchRule::ExplicitName,
                MatchRule::PhaseCircuitRole(AnchorRole::Trail),
                MatchRule::PhaseCircuitRole(AnchorRole::Lead),
                MatchRule::PhaseCircuit,
                MatchRule::ExactName,
            ]
        );
        assert_eq!(match_rules(AnchorRole::Lead).len(), 4);
    }
}
