use super::*;

fn settings_with_key() -> ChatSettings {
    ChatSettings { api_key: "sk-test-12345678".into(), ..ChatSettings::default() }
}

fn streaming_conversation() -> Conversation {
    let mut conv = Conversation::new(settings_with_key());
    conv.submit("hi").unwrap();
    conv.open_assistant_placeholder();
    conv
}

// =========================================================================
// submit
// =========================================================================

#[test]
fn submit_appends_user_message_and_starts_streaming() {
    let mut conv = Conversation::new(settings_with_key());
    conv.set_input_text("hi");

    let request = conv.submit("hi").unwrap();

    assert_eq!(conv.messages().len(), 1);
    assert_eq!(conv.messages()[0].role, Role::User);
    assert_eq!(conv.messages()[0].content, "hi");
    assert_eq!(conv.input_text(), "");
    assert!(conv.is_loading());
    assert_eq!(conv.phase(), Phase::Streaming);
    assert_eq!(request.user_message, "hi");
    assert_eq!(request.model, "gpt-4.1-mini");
    assert_eq!(request.api_key, "sk-test-12345678");
    assert!(request.chat_history.is_empty());
}

#[test]
fn submit_rejects_blank_input() {
    let mut conv = Conversation::new(settings_with_key());
    assert_eq!(conv.submit("  \n\t").unwrap_err(), SubmitRejection::EmptyInput);
    assert!(conv.messages().is_empty());
    assert!(!conv.is_loading());
}

#[test]
fn submit_rejects_missing_credential() {
    let mut conv = Conversation::default();
    conv.set_input_text("hi");
    assert_eq!(conv.submit("hi").unwrap_err(), SubmitRejection::MissingCredential);
    assert!(conv.messages().is_empty());
    assert_eq!(conv.input_text(), "hi");
}

#[test]
fn submit_rejects_while_streaming() {
    let mut conv = streaming_conversation();
    assert_eq!(conv.submit("again").unwrap_err(), SubmitRejection::Busy);
    assert_eq!(conv.messages().len(), 2);
}

#[test]
fn history_excludes_current_message_and_blank_entries() {
    let mut conv = streaming_conversation();
    conv.complete_or_fail(Some(ERROR_MESSAGE_TEXT));

    let request = conv.submit("second").unwrap();

    // user "hi", empty placeholder (dropped), error message
    let roles: Vec<Role> = request.chat_history.iter().map(|h| h.role).collect();
    assert_eq!(roles, vec![Role::User, Role::Assistant]);
    assert_eq!(request.chat_history[0].content, "hi");
    assert_eq!(request.chat_history[1].content, ERROR_MESSAGE_TEXT);
}

// =========================================================================
// placeholder / patch
// =========================================================================

#[test]
fn placeholder_is_empty_assistant_message() {
    let conv = streaming_conversation();
    let last = conv.messages().last().unwrap();
    assert_eq!(last.role, Role::Assistant);
    assert_eq!(last.content, "");
}

#[test]
fn placeholder_ignored_when_idle() {
    let mut conv = Conversation::new(settings_with_key());
    conv.open_assistant_placeholder();
    assert!(conv.messages().is_empty());
}

#[test]
fn patch_replaces_last_message_content() {
    let mut conv = streaming_conversation();
    assert!(conv.patch_assistant_content("He"));
    assert!(conv.patch_assistant_content("Hello"));

    assert_eq!(conv.messages()[1].content, "Hello");
    assert_eq!(conv.messages()[0].content, "hi");
}

#[test]
fn patch_never_touches_a_user_message() {
    let mut conv = Conversation::new(settings_with_key());
    conv.submit("hi").unwrap();
    assert!(!conv.patch_assistant_content("overwrite"));
    assert_eq!(conv.messages()[0].content, "hi");
}

#[test]
fn patch_rejected_after_completion() {
    let mut conv = streaming_conversation();
    conv.patch_assistant_content("done");
    conv.complete_or_fail(None);
    assert!(!conv.patch_assistant_content("late"));
    assert_eq!(conv.messages()[1].content, "done");
}

#[test]
fn message_ids_follow_append_order() {
    let mut conv = streaming_conversation();
    conv.complete_or_fail(Some(ERROR_MESSAGE_TEXT));
    let ids: Vec<_> = conv.messages().iter().map(|m| m.id).collect();
    let mut sorted = ids.clone();
    sorted.sort();
    assert_eq!(ids, sorted);
}

// =========================================================================
// complete / fail
// =========================================================================

#[test]
fn complete_returns_to_idle() {
    let mut conv = streaming_conversation();
    conv.patch_assistant_content("Hello");
    conv.complete_or_fail(None);

    assert!(!conv.is_loading());
    assert_eq!(conv.messages().len(), 2);
}

#[test]
fn failure_appends_separate_error_message() {
    let mut conv = streaming_conversation();
    conv.complete_or_fail(Some(ERROR_MESSAGE_TEXT));

    assert!(!conv.is_loading());
    assert_eq!(conv.messages().len(), 3);
    assert_eq!(conv.messages()[1].content, "");
    assert_eq!(conv.messages()[2].role, Role::Assistant);
    assert_eq!(conv.messages()[2].content, ERROR_MESSAGE_TEXT);
}

// =========================================================================
// announcement / settings
// =========================================================================

#[test]
fn announcement_tracks_last_non_empty_message() {
    let mut conv = Conversation::new(settings_with_key());
    assert_eq!(conv.announcement(), "");

    conv.submit("hi").unwrap();
    assert_eq!(conv.announcement(), "You said: hi");

    conv.open_assistant_placeholder();
    assert_eq!(conv.announcement(), "You said: hi");

    conv.patch_assistant_content("He");
    assert_eq!(conv.announcement(), "AI responded: He");
    conv.patch_assistant_content("Hello");
    assert_eq!(conv.announcement(), "AI responded: Hello");
}

#[test]
fn toggle_settings_flips_visibility() {
    let mut conv = Conversation::default();
    assert!(!conv.show_settings());
    assert!(conv.toggle_settings());
    assert!(!conv.toggle_settings());
}

#[test]
fn set_settings_enables_submission() {
    let mut conv = Conversation::default();
    assert_eq!(conv.validate_submit("hi"), Err(SubmitRejection::MissingCredential));
    conv.set_settings(settings_with_key());
    assert_eq!(conv.validate_submit("hi"), Ok(()));
}
