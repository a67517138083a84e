use rusqlite::Connection;
use std::cell::RefCell;
use std::rc::Rc;
use uuid::Uuid;
use venuebook_core::db::open_db_in_memory;
use venuebook_core::service::venue_service::{
    MSG_ACCESS_DENIED, MSG_DESCRIPTION_TOO_LONG, MSG_INVALID_RSVP, MSG_LOGIN_REQUIRED,
    MSG_LOGIN_REQUIRED_RSVP, MSG_NO_SUCH_VENUE, MSG_REQUIRED_PARAMETER, MSG_TITLE_TOO_LONG,
    MSG_VENUE_IS_PUBLIC,
};
use venuebook_core::{
    Caller, CreateVenueRequest, EmailMessage, FieldUpdate, GeoPoint, Mailer, MailerError,
    MethodError, Rsvp, SqliteContactDirectory, SqliteVenueRepository, VenueId, VenueService,
};

/// Test mailer capturing every send for inspection.
#[derive(Clone, Default)]
struct RecordingMailer {
    sent: Rc<RefCell<Vec<EmailMessage>>>,
    fail: Rc<RefCell<bool>>,
}

impl RecordingMailer {
    fn sent(&self) -> Vec<EmailMessage> {
        self.sent.borrow().clone()
    }

    fn fail_next_sends(&self) {
        *self.fail.borrow_mut() = true;
    }
}

impl Mailer for RecordingMailer {
    fn send(&self, message: &EmailMessage) -> Result<(), MailerError> {
        if *self.fail.borrow() {
            return Err(MailerError::Send("simulated outage".to_string()));
        }
        self.sent.borrow_mut().push(message.clone());
        Ok(())
    }
}

type TestService<'c> =
    VenueService<SqliteVenueRepository<'c>, SqliteContactDirectory<'c>, RecordingMailer>;

fn service(conn: &Connection) -> (TestService<'_>, RecordingMailer) {
    let mailer = RecordingMailer::default();
    let service = VenueService::new(
        SqliteVenueRepository::new(conn),
        SqliteContactDirectory::new(conn),
        mailer.clone(),
    );
    (service, mailer)
}

fn request(title: &str, description: &str, is_public: bool) -> CreateVenueRequest {
    CreateVenueRequest {
        title: Some(title.to_string()),
        description: Some(description.to_string()),
        location: GeoPoint { x: 0.5, y: 0.5 },
        is_public,
    }
}

fn create_venue(service: &TestService<'_>, owner: Uuid, is_public: bool) -> VenueId {
    service
        .create_venue(
            &Caller::User(owner),
            &request("Launch Party", "Come celebrate", is_public),
        )
        .unwrap()
}

mod create {
    use super::*;

    #[test]
    fn returns_fresh_id_and_empty_state() {
        let conn = open_db_in_memory().unwrap();
        let (service, _) = service(&conn);
        let owner = Uuid::new_v4();

        let id = create_venue(&service, owner, false);

        let venue = service.get_venue(id).unwrap().unwrap();
        assert_eq!(venue.owner, owner);
        assert!(!venue.is_public);
        assert!(venue.invited.is_empty());
        assert!(venue.rsvps.is_empty());
    }

    #[test]
    fn missing_or_empty_parameters_are_bad_requests() {
        let conn = open_db_in_memory().unwrap();
        let (service, _) = service(&conn);
        let caller = Caller::User(Uuid::new_v4());

        let missing_title = CreateVenueRequest {
            title: None,
            ..request("ignored", "desc", true)
        };
        let err = service.create_venue(&caller, &missing_title).unwrap_err();
        assert!(matches!(err, MethodError::BadRequest(MSG_REQUIRED_PARAMETER)));

        let empty_description = request("title", "", true);
        let err = service
            .create_venue(&caller, &empty_description)
            .unwrap_err();
        assert!(matches!(err, MethodError::BadRequest(MSG_REQUIRED_PARAMETER)));
    }

    #[test]
    fn length_limits_are_boundary_exact() {
        let conn = open_db_in_memory().unwrap();
        let (service, _) = service(&conn);
        let caller = Caller::User(Uuid::new_v4());

        service
            .create_venue(&caller, &request(&"t".repeat(100), "desc", true))
            .unwrap();
        let err = service
            .create_venue(&caller, &request(&"t".repeat(101), "desc", true))
            .unwrap_err();
        assert!(matches!(err, MethodError::PayloadTooLarge(MSG_TITLE_TOO_LONG)));
        assert_eq!(err.code(), 413);

        service
            .create_venue(&caller, &request("title", &"d".repeat(1000), true))
            .unwrap();
        let err = service
            .create_venue(&caller, &request("title", &"d".repeat(1001), true))
            .unwrap_err();
        assert!(matches!(
            err,
            MethodError::PayloadTooLarge(MSG_DESCRIPTION_TOO_LONG)
        ));
    }

    #[test]
    fn anonymous_caller_is_forbidden_after_input_checks() {
        let conn = open_db_in_memory().unwrap();
        let (service, _) = service(&conn);

        // Valid input, no session: the auth refusal.
        let err = service
            .create_venue(&Caller::Anonymous, &request("title", "desc", true))
            .unwrap_err();
        assert!(matches!(err, MethodError::Forbidden(MSG_LOGIN_REQUIRED)));
        assert_eq!(err.code(), 403);

        // Missing input and no session: input validation wins, observable
        // because the checks run in a fixed order.
        let broken = CreateVenueRequest {
            title: None,
            ..request("ignored", "desc", true)
        };
        let err = service.create_venue(&Caller::Anonymous, &broken).unwrap_err();
        assert!(matches!(err, MethodError::BadRequest(MSG_REQUIRED_PARAMETER)));
    }
}

mod invite {
    use super::*;

    #[test]
    fn missing_venue_and_foreign_venue_share_one_error() {
        let conn = open_db_in_memory().unwrap();
        let (service, _) = service(&conn);
        let owner = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let venue_id = create_venue(&service, owner, false);

        let err = service
            .invite(&Caller::User(owner), Uuid::new_v4(), &stranger)
            .unwrap_err();
        assert!(matches!(err, MethodError::NotFound(MSG_NO_SUCH_VENUE)));

        let err = service
            .invite(&Caller::User(stranger), venue_id, &stranger)
            .unwrap_err();
        assert!(matches!(err, MethodError::NotFound(MSG_NO_SUCH_VENUE)));

        let err = service
            .invite(&Caller::Anonymous, venue_id, &stranger)
            .unwrap_err();
        assert!(matches!(err, MethodError::NotFound(MSG_NO_SUCH_VENUE)));
    }

    #[test]
    fn public_venue_rejects_invites() {
        let conn = open_db_in_memory().unwrap();
        let (service, _) = service(&conn);
        let owner = Uuid::new_v4();
        let venue_id = create_venue(&service, owner, true);

        let err = service
            .invite(&Caller::User(owner), venue_id, &Uuid::new_v4())
            .unwrap_err();
        assert!(matches!(err, MethodError::BadRequest(MSG_VENUE_IS_PUBLIC)));
        assert_eq!(err.code(), 400);
    }

    #[test]
    fn invite_is_idempotent_and_notifies_once() {
        let conn = open_db_in_memory().unwrap();
        let (service, mailer) = service(&conn);
        let directory = SqliteContactDirectory::new(&conn);

        let owner = Uuid::new_v4();
        let guest = Uuid::new_v4();
        directory
            .set_contact_email(&owner, Some("host@example.com"))
            .unwrap();
        directory
            .set_contact_email(&guest, Some("guest@example.com"))
            .unwrap();

        let venue_id = create_venue(&service, owner, false);
        service.invite(&Caller::User(owner), venue_id, &guest).unwrap();
        service.invite(&Caller::User(owner), venue_id, &guest).unwrap();

        let venue = service.get_venue(venue_id).unwrap().unwrap();
        assert_eq!(venue.invited.len(), 1);

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "guest@example.com");
        assert_eq!(sent[0].reply_to.as_deref(), Some("host@example.com"));
        assert_eq!(sent[0].subject, "Venue: Launch Party");
    }

    #[test]
    fn inviting_the_owner_is_a_silent_no_op() {
        let conn = open_db_in_memory().unwrap();
        let (service, mailer) = service(&conn);
        let owner = Uuid::new_v4();
        let venue_id = create_venue(&service, owner, false);

        service.invite(&Caller::User(owner), venue_id, &owner).unwrap();

        let venue = service.get_venue(venue_id).unwrap().unwrap();
        assert!(venue.invited.is_empty());
        assert!(mailer.sent().is_empty());
    }

    #[test]
    fn missing_contact_address_skips_notification() {
        let conn = open_db_in_memory().unwrap();
        let (service, mailer) = service(&conn);
        let owner = Uuid::new_v4();
        let guest = Uuid::new_v4();
        let venue_id = create_venue(&service, owner, false);

        service.invite(&Caller::User(owner), venue_id, &guest).unwrap();

        let venue = service.get_venue(venue_id).unwrap().unwrap();
        assert!(venue.invited.contains(&guest));
        assert!(mailer.sent().is_empty());
    }

    #[test]
    fn mailer_failure_never_fails_the_invite() {
        let conn = open_db_in_memory().unwrap();
        let (service, mailer) = service(&conn);
        let directory = SqliteContactDirectory::new(&conn);

        let owner = Uuid::new_v4();
        let guest = Uuid::new_v4();
        directory
            .set_contact_email(&guest, Some("guest@example.com"))
            .unwrap();
        mailer.fail_next_sends();

        let venue_id = create_venue(&service, owner, false);
        service.invite(&Caller::User(owner), venue_id, &guest).unwrap();

        let venue = service.get_venue(venue_id).unwrap().unwrap();
        assert!(venue.invited.contains(&guest));
        assert!(mailer.sent().is_empty());
    }
}

mod rsvp {
    use super::*;

    #[test]
    fn validation_order_auth_then_response_then_venue() {
        let conn = open_db_in_memory().unwrap();
        let (service, _) = service(&conn);
        let owner = Uuid::new_v4();
        let venue_id = create_venue(&service, owner, true);

        // Anonymous beats even an invalid response string.
        let err = service
            .rsvp(&Caller::Anonymous, venue_id, "definitely")
            .unwrap_err();
        assert!(matches!(err, MethodError::Forbidden(MSG_LOGIN_REQUIRED_RSVP)));

        let err = service
            .rsvp(&Caller::User(owner), venue_id, "definitely")
            .unwrap_err();
        assert!(matches!(err, MethodError::BadRequest(MSG_INVALID_RSVP)));

        let err = service
            .rsvp(&Caller::User(owner), Uuid::new_v4(), "yes")
            .unwrap_err();
        assert!(matches!(err, MethodError::NotFound(MSG_NO_SUCH_VENUE)));
    }

    #[test]
    fn private_venue_hides_itself_from_outsiders() {
        let conn = open_db_in_memory().unwrap();
        let (service, _) = service(&conn);
        let owner = Uuid::new_v4();
        let outsider = Uuid::new_v4();
        let venue_id = create_venue(&service, owner, false);

        let err = service
            .rsvp(&Caller::User(outsider), venue_id, "yes")
            .unwrap_err();
        assert!(matches!(err, MethodError::NotFound(MSG_NO_SUCH_VENUE)));
        assert_eq!(err.code(), 404);

        // The owner and invited users get through.
        service.rsvp(&Caller::User(owner), venue_id, "yes").unwrap();
        service.invite(&Caller::User(owner), venue_id, &outsider).unwrap();
        service.rsvp(&Caller::User(outsider), venue_id, "maybe").unwrap();

        let venue = service.get_venue(venue_id).unwrap().unwrap();
        assert_eq!(venue.rsvps.len(), 2);
    }

    #[test]
    fn repeat_rsvp_updates_in_place() {
        let conn = open_db_in_memory().unwrap();
        let (service, _) = service(&conn);
        let owner = Uuid::new_v4();
        let friend = Uuid::new_v4();
        let venue_id = create_venue(&service, owner, true);

        service.rsvp(&Caller::User(owner), venue_id, "yes").unwrap();
        service.rsvp(&Caller::User(friend), venue_id, "no").unwrap();
        service.rsvp(&Caller::User(owner), venue_id, "maybe").unwrap();

        let venue = service.get_venue(venue_id).unwrap().unwrap();
        assert_eq!(venue.rsvps.len(), 2);
        assert_eq!(venue.rsvps[0].user, owner);
        assert_eq!(venue.rsvps[0].response, Rsvp::Maybe);
        assert_eq!(venue.rsvps[1].user, friend);
        assert_eq!(venue.rsvps[1].response, Rsvp::No);
        assert_eq!(venue.attending(), 0);
    }
}

mod update_fields {
    use super::*;

    #[test]
    fn owner_may_write_allow_listed_fields_without_validation() {
        let conn = open_db_in_memory().unwrap();
        let (service, _) = service(&conn);
        let owner = Uuid::new_v4();
        let venue_id = create_venue(&service, owner, true);

        // The generic path is deliberately permissive: a title far over the
        // creation limit goes through untouched.
        let oversized = "t".repeat(500);
        service
            .update_venue_fields(
                &Caller::User(owner),
                venue_id,
                &[
                    FieldUpdate::text("title", oversized.clone()),
                    FieldUpdate::real("y", 0.9),
                ],
            )
            .unwrap();

        let venue = service.get_venue(venue_id).unwrap().unwrap();
        assert_eq!(venue.title, oversized);
        assert_eq!(venue.location.y, 0.9);
    }

    #[test]
    fn non_owner_is_always_forbidden() {
        let conn = open_db_in_memory().unwrap();
        let (service, _) = service(&conn);
        let owner = Uuid::new_v4();
        let venue_id = create_venue(&service, owner, true);

        for caller in [Caller::User(Uuid::new_v4()), Caller::Anonymous] {
            let err = service
                .update_venue_fields(&caller, venue_id, &[FieldUpdate::text("title", "Hi")])
                .unwrap_err();
            assert!(matches!(err, MethodError::Forbidden(MSG_ACCESS_DENIED)));
        }

        let venue = service.get_venue(venue_id).unwrap().unwrap();
        assert_eq!(venue.title, "Launch Party");
    }

    #[test]
    fn fields_outside_allow_list_are_forbidden_even_for_owner() {
        let conn = open_db_in_memory().unwrap();
        let (service, _) = service(&conn);
        let owner = Uuid::new_v4();
        let venue_id = create_venue(&service, owner, true);

        let err = service
            .update_venue_fields(
                &Caller::User(owner),
                venue_id,
                &[
                    FieldUpdate::text("title", "fine"),
                    FieldUpdate::text("owner", "hijack"),
                ],
            )
            .unwrap_err();
        assert!(matches!(err, MethodError::Forbidden(MSG_ACCESS_DENIED)));
        assert_eq!(err.code(), 403);
    }

    #[test]
    fn missing_venue_is_not_found() {
        let conn = open_db_in_memory().unwrap();
        let (service, _) = service(&conn);

        let err = service
            .update_venue_fields(
                &Caller::User(Uuid::new_v4()),
                Uuid::new_v4(),
                &[FieldUpdate::text("title", "Hi")],
            )
            .unwrap_err();
        assert!(matches!(err, MethodError::NotFound(MSG_NO_SUCH_VENUE)));
    }
}

mod delete {
    use super::*;

    #[test]
    fn owner_deletes_when_nobody_attends() {
        let conn = open_db_in_memory().unwrap();
        let (service, _) = service(&conn);
        let owner = Uuid::new_v4();
        let venue_id = create_venue(&service, owner, true);

        service.rsvp(&Caller::User(Uuid::new_v4()), venue_id, "maybe").unwrap();
        service.delete_venue(&Caller::User(owner), venue_id).unwrap();
        assert!(service.get_venue(venue_id).unwrap().is_none());
    }

    #[test]
    fn any_yes_rsvp_blocks_deletion_for_everyone() {
        let conn = open_db_in_memory().unwrap();
        let (service, _) = service(&conn);
        let owner = Uuid::new_v4();
        let guest = Uuid::new_v4();
        let venue_id = create_venue(&service, owner, true);
        service.rsvp(&Caller::User(guest), venue_id, "yes").unwrap();

        for caller in [
            Caller::User(owner),
            Caller::User(guest),
            Caller::User(Uuid::new_v4()),
            Caller::Anonymous,
        ] {
            let err = service.delete_venue(&caller, venue_id).unwrap_err();
            assert!(matches!(err, MethodError::Forbidden(MSG_ACCESS_DENIED)));
        }

        // Once the guest backs out, the owner can delete.
        service.rsvp(&Caller::User(guest), venue_id, "no").unwrap();
        service.delete_venue(&Caller::User(owner), venue_id).unwrap();
    }

    #[test]
    fn non_owner_cannot_delete() {
        let conn = open_db_in_memory().unwrap();
        let (service, _) = service(&conn);
        let owner = Uuid::new_v4();
        let venue_id = create_venue(&service, owner, true);

        let err = service
            .delete_venue(&Caller::User(Uuid::new_v4()), venue_id)
            .unwrap_err();
        assert!(matches!(err, MethodError::Forbidden(MSG_ACCESS_DENIED)));
        assert!(service.get_venue(venue_id).unwrap().is_some());
    }
}

#[test]
fn launch_party_walkthrough() {
    let conn = open_db_in_memory().unwrap();
    let (service, _) = service(&conn);
    let host = Uuid::new_v4();
    let friend = Uuid::new_v4();

    let venue_id = service
        .create_venue(
            &Caller::User(host),
            &request("Launch Party", "Come celebrate", false),
        )
        .unwrap();

    let err = service.rsvp(&Caller::Anonymous, venue_id, "maybe").unwrap_err();
    assert!(matches!(err, MethodError::Forbidden(MSG_LOGIN_REQUIRED_RSVP)));

    service.invite(&Caller::User(host), venue_id, &friend).unwrap();
    service.rsvp(&Caller::User(friend), venue_id, "yes").unwrap();

    let venue = service.get_venue(venue_id).unwrap().unwrap();
    assert_eq!(venue.attending(), 1);
    assert_eq!(venue.rsvp_of(&friend), Some(Rsvp::Yes));
}
