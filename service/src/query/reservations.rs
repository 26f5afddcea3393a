//! [`Query`] collection related to the multiple [`Reservation`]s.

use common::operations::By;

use crate::{
    domain::{
        reservation::{self, guest},
        Reservation,
    },
    read,
};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries [`Reservation`]s of a guest by their [`guest::Email`], newest
/// first.
pub type ByGuestEmail = DatabaseQuery<By<Vec<Reservation>, guest::Email>>;

/// Queries [`Reservation`]s in a [`reservation::Status`], newest first.
pub type ByStatus = DatabaseQuery<By<Vec<Reservation>, reservation::Status>>;

/// Queries numbers of [`Reservation`]s in every [`reservation::Status`].
pub type CountsByStatus =
    DatabaseQuery<By<read::reservation::CountsByStatus, ()>>;

/// Queries a page of [`Reservation`]s, newest first.
pub type List = DatabaseQuery<
    By<read::reservation::list::Page, read::reservation::list::Selector>,
>;

/// Queries total count of [`Reservation`]s passing a
/// [`read::reservation::list::Filter`].
pub type TotalCount = DatabaseQuery<
    By<read::reservation::list::TotalCount, read::reservation::list::Filter>,
>;

#[cfg(test)]
mod spec {
    use std::cmp::Reverse;

    use common::pagination;

    use crate::{
        command::{self, Command as _},
        domain::{
            reservation::{guest::Email, Status},
            session::Initiator,
            Reservation,
        },
        read::reservation::list,
        test_util::{self, booking, day, reserve, service},
    };

    use super::{ByGuestEmail, ByStatus, CountsByStatus, List, TotalCount};

    fn newest_first(mut reservations: Vec<Reservation>) -> Vec<Reservation> {
        reservations.sort_by_key(|r| Reverse((r.created_at, r.id)));
        reservations
    }

    #[tokio::test]
    async fn returns_guest_reservations_newest_first() {
        let svc = service();
        let room = test_util::room(&svc, "R101", "100").await;
        let older = reserve(&svc, room.id, day(1), day(3)).await;
        let newer = reserve(&svc, room.id, day(5), day(7)).await;

        let mut foreign = booking(room.id, day(10), day(11));
        foreign.guest.email = Email::new("john@example.com").unwrap();
        drop(svc.execute(foreign).await.unwrap());

        let found = svc
            .execute(ByGuestEmail::by(Email::new("jane@example.com").unwrap()))
            .await
            .unwrap();

        assert_eq!(found, newest_first(vec![older, newer]));
    }

    #[tokio::test]
    async fn groups_reservations_by_status() {
        let svc = service();
        let room = test_util::room(&svc, "R101", "100").await;
        let first = reserve(&svc, room.id, day(1), day(3)).await;
        drop(reserve(&svc, room.id, day(5), day(7)).await);
        drop(
            svc.execute(command::TransitionReservation {
                reservation_id: first.id,
                status: Status::Confirmed,
                expected_status: None,
                initiator: Initiator::Staff,
            })
            .await
            .unwrap(),
        );

        let confirmed =
            svc.execute(ByStatus::by(Status::Confirmed)).await.unwrap();
        assert_eq!(confirmed.len(), 1);
        assert_eq!(confirmed[0].id, first.id);

        let counts = svc.execute(CountsByStatus::by(())).await.unwrap();
        assert_eq!(counts.get(Status::Pending), 1);
        assert_eq!(counts.get(Status::Confirmed), 1);
        assert_eq!(counts.get(Status::Cancelled), 0);
        assert_eq!(counts.total(), 2);
    }

    #[tokio::test]
    async fn paginates_and_counts_filtered_reservations() {
        let svc = service();
        let room = test_util::room(&svc, "R101", "100").await;
        let mut created = vec![];
        for i in 0..5 {
            created
                .push(reserve(&svc, room.id, day(i * 2), day(i * 2 + 1)).await);
        }
        let expected = newest_first(created)
            .into_iter()
            .map(|r| r.id)
            .collect::<Vec<_>>();

        let first = svc
            .execute(List::by(list::Selector {
                arguments: pagination::Arguments::new(
                    Some(2),
                    None,
                    None,
                    None,
                    20,
                )
                .unwrap(),
                filter: list::Filter::default(),
            }))
            .await
            .unwrap();
        let ids = first.edges.iter().map(|e| e.node.id).collect::<Vec<_>>();
        assert_eq!(ids, expected[..2]);
        assert!(first.page_info().has_next_page);

        let second = svc
            .execute(List::by(list::Selector {
                arguments: pagination::Arguments::new(
                    Some(10),
                    first.page_info().end_cursor,
                    None,
                    None,
                    20,
                )
                .unwrap(),
                filter: list::Filter::default(),
            }))
            .await
            .unwrap();
        let ids = second.edges.iter().map(|e| e.node.id).collect::<Vec<_>>();
        assert_eq!(ids, expected[2..]);
        assert!(!second.page_info().has_next_page);

        let total = svc
            .execute(TotalCount::by(list::Filter {
                status: Some(Status::Pending),
                ..list::Filter::default()
            }))
            .await
            .unwrap();
        assert_eq!(i64::from(total), 5);

        let total = svc
            .execute(TotalCount::by(list::Filter {
                status: Some(Status::Cancelled),
                ..list::Filter::default()
            }))
            .await
            .unwrap();
        assert_eq!(i64::from(total), 0);
    }
}
