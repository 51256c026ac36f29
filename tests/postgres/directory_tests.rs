//! `PostgreSQL` identity directory tests.

use crate::postgres::helpers::{PgContext, pg_context, who};
use rstest::rstest;
use taskboard::task::{
    domain::{Identity, TeamName},
    ports::IdentityDirectory,
};

fn addresses(identities: &[Identity]) -> Vec<&str> {
    identities.iter().map(Identity::as_str).collect()
}

fn seed(context: &PgContext) {
    for (email, team, approved) in [
        ("alice@x.com", None, true),
        ("Carol@X.com", Some("AI"), true),
        ("frank@x.com", Some("AI"), true),
        ("dave@x.com", Some("AI"), false),
        ("erin@x.com", Some("Ops"), true),
        ("ERIN@x.com", Some("Ops"), true),
    ] {
        context
            .insert_user(email, team, approved)
            .expect("insert user");
    }
}

#[rstest]
#[case("carol@x.com", true)]
#[case("CAROL@x.com", true)]
#[case("dave@x.com", true)]
#[case("zoe@x.com", false)]
fn registration_ignores_stored_case(
    pg_context: Option<PgContext>,
    #[case] address: &str,
    #[case] expected: bool,
) {
    let Some(context) = pg_context else { return };
    seed(&context);

    let registered = context
        .run(context.directory.is_registered(&who(address)))
        .expect("lookup");

    assert_eq!(registered, expected);
}

#[rstest]
fn team_listing_returns_approved_members_lower_cased(pg_context: Option<PgContext>) {
    let Some(context) = pg_context else { return };
    seed(&context);
    let team = TeamName::new("AI").expect("valid team");

    let members = context
        .run(context.directory.list_approved_by_team(&team))
        .expect("team listing");

    assert_eq!(addresses(&members), vec!["carol@x.com", "frank@x.com"]);
}

#[rstest]
fn approved_listing_folds_case_variants(pg_context: Option<PgContext>) {
    let Some(context) = pg_context else { return };
    seed(&context);

    let approved = context
        .run(context.directory.list_approved())
        .expect("approved listing");

    assert_eq!(
        addresses(&approved),
        vec!["alice@x.com", "carol@x.com", "erin@x.com", "frank@x.com"]
    );
}

#[rstest]
fn unknown_team_has_no_members(pg_context: Option<PgContext>) {
    let Some(context) = pg_context else { return };
    seed(&context);
    let team = TeamName::new("Legal").expect("valid team");

    let members = context
        .run(context.directory.list_approved_by_team(&team))
        .expect("team listing");

    assert!(members.is_empty());
}
