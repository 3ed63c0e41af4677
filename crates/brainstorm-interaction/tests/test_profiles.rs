use brainstorm_core::generator::{GeneratorRole, ResponseMode};
use brainstorm_interaction::profiles::{ProfileTable, default_profile};

#[test]
fn test_every_role_has_a_profile() {
    let table = ProfileTable::default();
    for role in GeneratorRole::ALL {
        let profile = table.get(role).expect("Should have a profile");
        assert_eq!(profile.role, role);
        assert_eq!(profile.model_id, "deepseek-r1:1.5b");
        assert_eq!(profile.response_mode, ResponseMode::Json);
        assert!(!profile.system_prompt.is_empty());
    }
}

#[test]
fn test_only_executor_thinks() {
    let table = ProfileTable::default();
    assert!(table.get(GeneratorRole::StepExecutor).unwrap().think);
    assert!(!table.get(GeneratorRole::IntentClassifier).unwrap().think);
    assert!(!table.get(GeneratorRole::StepPlanner).unwrap().think);
}

#[test]
fn test_insert_replaces_profile() {
    let mut table = ProfileTable::default();
    let mut profile = default_profile(GeneratorRole::FreeChat, "llava");
    profile.response_mode = ResponseMode::Text;
    table.insert(profile);

    let stored = table.get(GeneratorRole::FreeChat).unwrap();
    assert_eq!(stored.model_id, "llava");
    assert_eq!(stored.response_mode, ResponseMode::Text);
}
