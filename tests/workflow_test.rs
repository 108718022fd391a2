mod common;

use common::{TestDatabase, create_event, event_request, guest, organizer, ticket};
use eventos_backend::{
    error::AppError,
    routes::{
        event::{
            filter::{PublicEventFilters, PublicEventQuery},
            model::Event,
        },
        favorite::model::{Favorite, FavoriteTarget},
        group::model::Group,
        guest::model::{CreateGuestRequest, Guest},
        ticket::model::{Participation, ParticipationState, Purchase},
    },
};
use serial_test::serial;

#[tokio::test]
#[serial]
async fn identical_locations_are_reused() {
    let Some(db) = TestDatabase::from_env().await else { return };
    let org = organizer(&db.pool, "org@example.com").await;

    let first = create_event(&db.pool, org.organizer_id, event_request("Show A", vec![])).await;
    let second = create_event(&db.pool, org.organizer_id, event_request("Show B", vec![])).await;

    assert_eq!(
        first.event.event.location_id,
        second.event.event.location_id
    );
    let locations: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM locations")
        .fetch_one(&db.pool)
        .await
        .unwrap();
    assert_eq!(locations, 1);
    assert!(first.group.is_some());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[serial]
async fn concurrent_creates_share_one_location() {
    let Some(db) = TestDatabase::from_env().await else { return };
    let org = organizer(&db.pool, "org@example.com").await;

    let mut tasks = tokio::task::JoinSet::new();
    for i in 0..8 {
        let pool = db.pool.clone();
        let organizer_id = org.organizer_id;
        tasks.spawn(async move {
            let req = event_request(&format!("Show {}", i), vec![]);
            Event::create(&pool, organizer_id, req.validate().unwrap()).await
        });
    }

    let mut location_ids = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        location_ids.push(joined.unwrap().unwrap().event.event.location_id);
    }
    location_ids.sort();
    location_ids.dedup();
    assert_eq!(location_ids.len(), 1);

    let locations: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM locations")
        .fetch_one(&db.pool)
        .await
        .unwrap();
    assert_eq!(locations, 1);
}

#[tokio::test]
#[serial]
async fn event_without_chat_has_no_group() {
    let Some(db) = TestDatabase::from_env().await else { return };
    let org = organizer(&db.pool, "org@example.com").await;

    let mut req = event_request("Palestra", vec![]);
    req.create_chat = false;
    let created = create_event(&db.pool, org.organizer_id, req).await;

    assert!(created.group.is_none());
    assert!(matches!(
        Group::join_event_group(&db.pool, 1, created.event.event.event_id).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
#[serial]
async fn repeated_purchase_keeps_one_participation() {
    let Some(db) = TestDatabase::from_env().await else { return };
    let org = organizer(&db.pool, "org@example.com").await;
    let maria = guest(&db.pool, "123.456.789-00", "maria@example.com").await;
    let created = create_event(
        &db.pool,
        org.organizer_id,
        event_request("Festival", vec![ticket("Pista", 80.0)]),
    )
    .await;
    let ticket_id = created.event.tickets[0].ticket_id;

    let first = Participation::participate(&db.pool, maria.guest_id, ticket_id, 1)
        .await
        .unwrap();
    let second = Participation::participate(&db.pool, maria.guest_id, ticket_id, 1)
        .await
        .unwrap();

    assert!(first.newly_confirmed);
    assert!(!second.newly_confirmed);
    assert_eq!(
        first.participation.participation_id,
        second.participation.participation_id
    );
    assert_eq!(first.event_id, created.event.event.event_id);

    let participations: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM participations WHERE guest_id = $1")
            .bind(maria.guest_id)
            .fetch_one(&db.pool)
            .await
            .unwrap();
    assert_eq!(participations, 1);
    let purchases: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM purchases WHERE guest_id = $1 AND ticket_id = $2")
            .bind(maria.guest_id)
            .bind(ticket_id)
            .fetch_one(&db.pool)
            .await
            .unwrap();
    assert_eq!(purchases, 2);

    let history = Purchase::history_for_guest(&db.pool, maria.guest_id)
        .await
        .unwrap();
    assert_eq!(history.len(), 2);
    assert!(history.iter().all(|p| p.purchase.total_amount == 80.0));
    assert!(history.iter().all(|p| p.event_name == "Festival"));
}

#[tokio::test]
#[serial]
async fn unknown_ticket_is_not_found() {
    let Some(db) = TestDatabase::from_env().await else { return };
    let maria = guest(&db.pool, "12345678900", "maria@example.com").await;

    let result = Participation::participate(&db.pool, maria.guest_id, 999, 1).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
#[serial]
async fn joining_twice_is_a_no_op() {
    let Some(db) = TestDatabase::from_env().await else { return };
    let org = organizer(&db.pool, "org@example.com").await;
    let maria = guest(&db.pool, "12345678900", "maria@example.com").await;
    let created = create_event(&db.pool, org.organizer_id, event_request("Encontro", vec![])).await;
    let event_id = created.event.event.event_id;

    let first = Group::join_event_group(&db.pool, maria.guest_id, event_id)
        .await
        .unwrap();
    let second = Group::join_event_group(&db.pool, maria.guest_id, event_id)
        .await
        .unwrap();

    assert!(!first.already_member);
    assert!(second.already_member);
    assert_eq!(first.group_id, second.group_id);
    let members: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM group_members WHERE group_id = $1")
        .bind(first.group_id)
        .fetch_one(&db.pool)
        .await
        .unwrap();
    assert_eq!(members, 1);

    let groups = Group::list_for_guest(&db.pool, maria.guest_id).await.unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].event_name, "Encontro");
}

#[tokio::test]
#[serial]
async fn favorites_are_idempotent_per_target() {
    let Some(db) = TestDatabase::from_env().await else { return };
    let org = organizer(&db.pool, "org@example.com").await;
    let maria = guest(&db.pool, "12345678900", "maria@example.com").await;
    let created = create_event(&db.pool, org.organizer_id, event_request("Feira", vec![])).await;
    let event = FavoriteTarget::Event(created.event.event.event_id);

    let (_, created_first) = Favorite::add(&db.pool, maria.guest_id, event).await.unwrap();
    let (_, created_again) = Favorite::add(&db.pool, maria.guest_id, event).await.unwrap();
    assert!(created_first);
    assert!(!created_again);

    // 组织者收藏是独立的唯一范围
    let (_, organizer_created) = Favorite::add(
        &db.pool,
        maria.guest_id,
        FavoriteTarget::Organizer(org.organizer_id),
    )
    .await
    .unwrap();
    assert!(organizer_created);

    let events = Favorite::list_events(&db.pool, maria.guest_id).await.unwrap();
    assert_eq!(events.len(), 1);
    let organizers = Favorite::list_organizers(&db.pool, maria.guest_id)
        .await
        .unwrap();
    assert_eq!(organizers.len(), 1);

    Favorite::remove(&db.pool, maria.guest_id, event).await.unwrap();
    assert!(matches!(
        Favorite::remove(&db.pool, maria.guest_id, event).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
#[serial]
async fn favoriting_a_missing_event_is_not_found() {
    let Some(db) = TestDatabase::from_env().await else { return };
    let maria = guest(&db.pool, "12345678900", "maria@example.com").await;

    let result = Favorite::add(&db.pool, maria.guest_id, FavoriteTarget::Event(404)).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
#[serial]
async fn participation_status_follows_confirmed_tickets() {
    let Some(db) = TestDatabase::from_env().await else { return };
    let org = organizer(&db.pool, "org@example.com").await;
    let maria = guest(&db.pool, "12345678900", "maria@example.com").await;

    let without_tickets = create_event(&db.pool, org.organizer_id, event_request("Sem ingressos", vec![])).await;
    assert_eq!(
        Participation::status_for_event(&db.pool, maria.guest_id, without_tickets.event.event.event_id)
            .await
            .unwrap(),
        ParticipationState::NotParticipating
    );

    let with_tickets = create_event(
        &db.pool,
        org.organizer_id,
        event_request("Com ingressos", vec![ticket("Grátis", 0.0)]),
    )
    .await;
    let event_id = with_tickets.event.event.event_id;
    assert_eq!(
        Participation::status_for_event(&db.pool, maria.guest_id, event_id)
            .await
            .unwrap(),
        ParticipationState::NotParticipating
    );

    Participation::participate(&db.pool, maria.guest_id, with_tickets.event.tickets[0].ticket_id, 1)
        .await
        .unwrap();
    assert_eq!(
        Participation::status_for_event(&db.pool, maria.guest_id, event_id)
            .await
            .unwrap(),
        ParticipationState::Participating
    );
}

#[tokio::test]
#[serial]
async fn public_listing_only_shows_active_events() {
    let Some(db) = TestDatabase::from_env().await else { return };
    let org = organizer(&db.pool, "org@example.com").await;

    let active = create_event(&db.pool, org.organizer_id, event_request("Ativo", vec![])).await;
    let mut draft = event_request("Rascunho", vec![]);
    draft.status = Some("rascunho".into());
    create_event(&db.pool, org.organizer_id, draft).await;

    let filters = PublicEventFilters::from(PublicEventQuery::default());
    let first = Event::list_public(&db.pool, &filters).await.unwrap();
    let second = Event::list_public(&db.pool, &filters).await.unwrap();

    assert_eq!(first.total, 1);
    assert_eq!(first.events.len(), 1);
    assert_eq!(first.events[0].event.event_id, active.event.event.event_id);
    assert_eq!(
        first.events.iter().map(|e| e.event.event_id).collect::<Vec<_>>(),
        second.events.iter().map(|e| e.event.event_id).collect::<Vec<_>>()
    );
}

#[tokio::test]
#[serial]
async fn price_filter_applies_within_the_page() {
    let Some(db) = TestDatabase::from_env().await else { return };
    let org = organizer(&db.pool, "org@example.com").await;

    create_event(&db.pool, org.organizer_id, event_request("Pago", vec![ticket("VIP", 150.0)])).await;
    create_event(&db.pool, org.organizer_id, event_request("Livre", vec![])).await;

    let filters = PublicEventFilters::from(PublicEventQuery {
        preco: Some("gratis".into()),
        ..Default::default()
    });
    let page = Event::list_public(&db.pool, &filters).await.unwrap();

    // 总数在价格筛选之前统计
    assert_eq!(page.total, 2);
    assert_eq!(page.events.len(), 1);
    assert_eq!(page.events[0].event.name, "Livre");
}

#[tokio::test]
#[serial]
async fn duplicate_guest_email_is_a_conflict() {
    let Some(db) = TestDatabase::from_env().await else { return };
    guest(&db.pool, "11111111111", "maria@example.com").await;

    let result = Guest::create(
        &db.pool,
        CreateGuestRequest {
            name: Some("Outra Maria".into()),
            cpf: Some("22222222222".into()),
            email: Some("maria@example.com".into()),
            password: Some("senha123".into()),
            phone: None,
            gender: None,
            birth_date: None,
            address: None,
            city: None,
            cep: None,
        },
    )
    .await;
    assert!(matches!(result, Err(AppError::Conflict(_))));
}

#[tokio::test]
#[serial]
async fn groups_outlive_their_event() {
    let Some(db) = TestDatabase::from_env().await else { return };
    let org = organizer(&db.pool, "org@example.com").await;
    let maria = guest(&db.pool, "12345678900", "maria@example.com").await;
    let created = create_event(&db.pool, org.organizer_id, event_request("Workshop", vec![])).await;
    let event_id = created.event.event.event_id;
    Group::join_event_group(&db.pool, maria.guest_id, event_id)
        .await
        .unwrap();

    sqlx::query("DELETE FROM events WHERE event_id = $1")
        .bind(event_id)
        .execute(&db.pool)
        .await
        .unwrap();

    let groups = Group::list_for_guest(&db.pool, maria.guest_id).await.unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].event_id, None);
    assert_eq!(groups[0].event_name, "Evento Removido");
}
