mod common;

use common::{Fixture, HOUR_MS, NOW};
use convoview_core::db::packages::OptionalPackage;
use convoview_core::{CallSource, HistoryError, ItemKind};

#[test]
fn email_detail_carries_the_whole_thread() {
    let fixture = Fixture::new();
    let lead = fixture.identity("Ada Lead", None);
    let thread = fixture.conversation(&lead, "Renewal");
    let first = fixture.email(&thread, "Renewal terms", NOW - 3 * HOUR_MS);
    let reply = fixture.email_with(&thread, "Re: Renewal terms", "Looks good", NOW - HOUR_MS, false);

    let detail = fixture.service().get_record_info(&first, "Email").unwrap();

    assert_eq!(detail.kind(), ItemKind::Email);
    assert_eq!(detail.record.source_id.as_deref(), Some(first.as_str()));
    assert_eq!(detail.items.len(), 2);
    assert_eq!(detail.items[0].item_type, "email");
    assert_eq!(detail.items[0].source_id.as_deref(), Some(first.as_str()));
    assert_eq!(detail.items[1].source_id.as_deref(), Some(reply.as_str()));
    assert_eq!(detail.items[1].is_outbound, Some(false));
    assert_eq!(detail.items[1].html_body.as_deref(), Some("<p>Looks good</p>"));
    assert_eq!(detail.items[1].from.as_deref(), Some("lead@prospect.test"));

    let conversation = detail.conversation.expect("email detail has its thread");
    assert_eq!(conversation.id, thread);
    assert_eq!(conversation.name, "Renewal");
    assert_eq!(conversation.identity_id, lead);
    assert_eq!(conversation.total_emails(), 2);
    assert_eq!(
        conversation.latest().and_then(|item| item.source_id.as_deref()),
        Some(reply.as_str())
    );
    assert!(detail.call.is_none());
    assert!(detail.step.is_none());
}

#[test]
fn task_call_detail_reports_owner_and_duration() {
    let fixture = Fixture::new();
    let lead = fixture.identity("Ada Lead", None);
    let call = fixture.call_task(
        &lead,
        "Discovery",
        Some("Phone: 555-010-0199\nWants a demo"),
        Some(150),
        NOW - HOUR_MS,
    );

    let detail = fixture.service().get_record_info(&call, "call").unwrap();

    let meta = detail.call.expect("call metadata");
    assert_eq!(meta.source, CallSource::Task);
    assert!(!meta.is_enterprise());
    assert_eq!(meta.owner_name.as_deref(), Some("Dana Owner"));
    assert_eq!(meta.created_by.as_deref(), Some("Sam Creator"));
    assert_eq!(meta.status.as_deref(), Some("Completed"));
    assert_eq!(meta.duration_label, "2 minutes 30 seconds");
    assert_eq!(meta.phone.as_deref(), Some("5550100199"));
    assert_eq!(detail.items.len(), 1);
    assert_eq!(detail.items[0].item_type, "call");
    assert!(detail.conversation.is_none());
}

#[test]
fn dialer_call_detail_includes_session() {
    let fixture = Fixture::with_packages(&[OptionalPackage::Dialer]);
    let lead = fixture.identity("Ada Lead", None);
    let session = fixture.dialer_session("Morning block");
    let started = NOW - HOUR_MS;
    let call = fixture.dialer_call(&lead, Some(&session), "5550100199", started, 3_660);

    let detail = fixture.service().get_record_info(&call, "Call").unwrap();

    assert_eq!(detail.record.provider, convoview_core::ProviderKind::Dialer);
    let meta = detail.call.expect("call metadata");
    assert!(meta.is_enterprise());
    assert_eq!(meta.session_name.as_deref(), Some("Morning block"));
    assert_eq!(meta.started_at_ms, Some(started));
    assert_eq!(meta.ended_at_ms, Some(started + 3_660_000));
    assert_eq!(meta.duration_label, "1 hour 1 minute");
    assert_eq!(meta.recording_id.as_deref(), Some("rec-42"));
}

#[test]
fn sms_detail_lists_the_identity_history_oldest_first() {
    let fixture = Fixture::with_packages(&[OptionalPackage::Sms]);
    let lead = fixture.identity("Ada Lead", None);
    let other = fixture.identity("Other Lead", None);
    let older = fixture.sms(&lead, "Are you free?", true, NOW - 3 * HOUR_MS);
    let newer = fixture.sms(&lead, "Yes, at 3", false, NOW - HOUR_MS);
    fixture.sms(&other, "Unrelated", true, NOW - 2 * HOUR_MS);

    let detail = fixture.service().get_record_info(&newer, "SMS").unwrap();

    assert_eq!(detail.record.body.as_deref(), Some("Yes, at 3"));
    let ids: Vec<_> = detail
        .items
        .iter()
        .map(|entry| entry.source_id.clone().unwrap())
        .collect();
    assert_eq!(ids, vec![older, newer]);
    assert!(detail.items.iter().all(|entry| entry.item_type == "sms"));
    assert_eq!(detail.items[1].is_outbound, Some(false));
}

#[test]
fn custom_step_detail_reports_cadence() {
    let fixture = Fixture::new();
    let lead = fixture.identity("Ada Lead", None);
    let step = fixture.step(&lead, "Intro call", "Completed", Some(NOW - HOUR_MS));

    let detail = fixture.service().get_record_info(&step, "Custom").unwrap();

    let meta = detail.step.expect("step metadata");
    assert_eq!(meta.step_name, "Intro call");
    assert_eq!(meta.step_number, 2);
    assert_eq!(meta.cadence_name.as_deref(), Some("Q4 Outbound"));
    assert_eq!(meta.status, "Completed");
    assert_eq!(meta.instructions.as_deref(), Some("Call before noon"));
    assert_eq!(detail.items[0].item_type, "custom");
    assert!(detail.record.conversation_id.is_none());
}

#[test]
fn unknown_or_inactive_kinds_are_not_found() {
    let fixture = Fixture::new();
    let lead = fixture.identity("Ada Lead", None);
    let step = fixture.step(&lead, "Intro call", "Completed", Some(NOW - HOUR_MS));
    let service = fixture.service();

    let unknown = service.get_record_info(&step, "Fax").unwrap_err();
    assert!(matches!(unknown, HistoryError::NotFound(_)));

    let inactive = service.get_record_info(&step, "SMS").unwrap_err();
    assert!(matches!(inactive, HistoryError::NotFound(_)));
}

#[test]
fn unknown_record_ids_are_rejected() {
    let fixture = Fixture::new();
    let lead = fixture.identity("Ada Lead", None);
    let step = fixture.step(&lead, "Intro call", "Completed", Some(NOW - HOUR_MS));
    let service = fixture.service();

    let missing = service.get_record_info("no-such-record", "Email").unwrap_err();
    assert!(matches!(missing, HistoryError::InvalidArgument(_)));

    // A real id under the wrong kind is just as unknown.
    let wrong_kind = service.get_record_info(&step, "Call").unwrap_err();
    assert!(wrong_kind.is_invalid_argument());

    let blank = service.get_record_info("", "Email").unwrap_err();
    assert!(blank.is_invalid_argument());
}
