//! [`Query`] collection related to the multiple [`Room`]s.

use std::collections::HashMap;

use common::{
    operations::{By, Select},
    Date, Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{reservation::Stay, room, Room},
    infra::{database, Database},
    read, Query, Service,
};

use super::DatabaseQuery;

/// Queries non-deleted [`Room`]s passing a [`read::room::Filter`], ordered
/// by their [`room::Number`].
pub type List = DatabaseQuery<By<Vec<Room>, read::room::Filter>>;

/// Queries [`Room`]s by their [`room::Id`]s, including the deleted ones.
pub type ByIds = DatabaseQuery<By<HashMap<room::Id, Room>, Vec<room::Id>>>;

/// [`Query`] of [`Room`]s available for booking, ordered by their
/// [`room::Number`].
///
/// Without a stay window and a [`room::Status`] override, looks for
/// [`room::Status::Available`] [`Room`]s free from today till tomorrow.
#[derive(Clone, Debug, Default)]
pub struct Available {
    /// Part of a [`room::Category`] to look for, ignoring the case.
    pub category: Option<room::Category>,

    /// Minimal price of a night, inclusive.
    pub min_price: Option<Money>,

    /// Maximal price of a night, inclusive.
    pub max_price: Option<Money>,

    /// [`room::Status`] to match exactly, overriding the default one.
    pub status: Option<room::Status>,

    /// Check-in [`Date`] of the window to be free within.
    pub check_in: Option<Date>,

    /// Check-out [`Date`] of the window to be free within.
    pub check_out: Option<Date>,
}

impl Available {
    /// Resolves the [`read::room::Filter`] of this [`Available`] [`Query`]
    /// on the provided `today` [`Date`].
    fn filter(
        self,
        today: Date,
    ) -> Result<read::room::Filter, ExecutionError> {
        use ExecutionError as E;

        let Self {
            category,
            min_price,
            max_price,
            status,
            check_in,
            check_out,
        } = self;

        let window = match (check_in, check_out) {
            (Some(check_in), Some(check_out)) => Some(
                Stay::new(check_in, check_out)
                    .ok_or(E::InvalidDateRange { check_in, check_out })?,
            ),
            (None, None) => None,
            (Some(_), None) | (None, Some(_)) => {
                return Err(E::IncompleteDateRange)
            }
        };

        let (statuses, free_within) = match (status, window) {
            (Some(status), window) => (vec![status], window),
            (None, Some(window)) => (
                room::Status::all().filter(|s| s.is_bookable()).collect(),
                Some(window),
            ),
            (None, None) => (
                vec![room::Status::Available],
                today
                    .checked_add_days(1)
                    .and_then(|tomorrow| Stay::new(today, tomorrow)),
            ),
        };

        Ok(read::room::Filter {
            category,
            min_price,
            max_price,
            statuses,
            free_within,
        })
    }
}

impl<Db> Query<Available> for Service<Db>
where
    Db: Database<
        Select<By<Vec<Room>, read::room::Filter>>,
        Ok = Vec<Room>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Vec<Room>;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, query: Available) -> Result<Self::Ok, Self::Err> {
        let filter = query.filter(Date::today()).map_err(tracerr::wrap!())?;

        self.database()
            .execute(Select(By::new(filter)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> ExecutionError))
    }
}

/// Error of [`Available`] [`Query`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// Check-out [`Date`] doesn't follow the check-in one.
    #[display("check-out `{check_out}` must follow check-in `{check_in}`")]
    #[from(ignore)]
    InvalidDateRange {
        /// Requested check-in [`Date`].
        check_in: Date,

        /// Requested check-out [`Date`].
        check_out: Date,
    },

    /// Only one bound of the window is provided.
    #[display("both check-in and check-out must be provided")]
    IncompleteDateRange,
}

#[cfg(test)]
mod spec {
    use crate::{
        command::{self, Command as _},
        domain::room,
        read,
        test_util::{self, day, reserve, service},
    };

    use super::{Available, ByIds, ExecutionError, List};

    fn numbers(rooms: &[room::Room]) -> Vec<String> {
        rooms.iter().map(|r| r.number.to_string()).collect()
    }

    #[tokio::test]
    async fn lists_rooms_by_number() {
        let svc = service();
        drop(test_util::room(&svc, "R102", "150").await);
        drop(test_util::room(&svc, "R101", "100").await);
        let deleted = test_util::room(&svc, "R100", "100").await;
        drop(
            svc.execute(command::DeleteRoom {
                room_id: deleted.id,
            })
            .await
            .unwrap(),
        );

        let rooms = svc
            .execute(List::by(read::room::Filter::default()))
            .await
            .unwrap();

        assert_eq!(numbers(&rooms), ["R101", "R102"]);
    }

    #[tokio::test]
    async fn resolves_deleted_rooms_by_ids() {
        let svc = service();
        let kept = test_util::room(&svc, "R101", "100").await;
        let deleted = test_util::room(&svc, "R102", "100").await;
        drop(
            svc.execute(command::DeleteRoom {
                room_id: deleted.id,
            })
            .await
            .unwrap(),
        );

        let rooms = svc
            .execute(ByIds::by(vec![kept.id, deleted.id, room::Id::new()]))
            .await
            .unwrap();

        assert_eq!(rooms.len(), 2);
        assert_eq!(rooms[&kept.id].number, kept.number);
        assert!(rooms[&deleted.id].is_deleted());
    }

    #[tokio::test]
    async fn filters_by_category_and_price() {
        let svc = service();
        drop(test_util::room(&svc, "R101", "100").await);
        drop(test_util::room(&svc, "R102", "150").await);
        drop(test_util::room(&svc, "R103", "300").await);

        let rooms = svc
            .execute(Available {
                category: Some(room::Category::new("deLUXE").unwrap()),
                min_price: Some("120".parse().unwrap()),
                max_price: Some("300".parse().unwrap()),
                ..Available::default()
            })
            .await
            .unwrap();
        assert_eq!(numbers(&rooms), ["R102", "R103"]);

        let rooms = svc
            .execute(Available {
                category: Some(room::Category::new("Suite").unwrap()),
                ..Available::default()
            })
            .await
            .unwrap();
        assert!(rooms.is_empty());
    }

    #[tokio::test]
    async fn excludes_rooms_booked_right_now() {
        let svc = service();
        let r101 = test_util::room(&svc, "R101", "100").await;
        drop(test_util::room(&svc, "R102", "100").await);
        drop(reserve(&svc, r101.id, day(0), day(2)).await);

        let rooms = svc.execute(Available::default()).await.unwrap();
        assert_eq!(numbers(&rooms), ["R102"]);

        let rooms = svc
            .execute(Available {
                check_in: Some(day(2)),
                check_out: Some(day(4)),
                ..Available::default()
            })
            .await
            .unwrap();
        assert_eq!(numbers(&rooms), ["R101", "R102"]);
    }

    #[tokio::test]
    async fn respects_status_override() {
        let svc = service();
        let r101 = test_util::room(&svc, "R101", "100").await;
        drop(test_util::room(&svc, "R102", "100").await);
        drop(
            svc.execute(command::UpdateRoom {
                room_id: r101.id,
                status: Some(room::Status::Maintenance),
                ..command::UpdateRoom::default()
            })
            .await
            .unwrap(),
        );

        let rooms = svc.execute(Available::default()).await.unwrap();
        assert_eq!(numbers(&rooms), ["R102"]);

        let rooms = svc
            .execute(Available {
                check_in: Some(day(1)),
                check_out: Some(day(2)),
                ..Available::default()
            })
            .await
            .unwrap();
        assert_eq!(numbers(&rooms), ["R102"]);

        let rooms = svc
            .execute(Available {
                status: Some(room::Status::Maintenance),
                ..Available::default()
            })
            .await
            .unwrap();
        assert_eq!(numbers(&rooms), ["R101"]);
    }

    #[tokio::test]
    async fn rejects_malformed_window() {
        let svc = service();

        let err = svc
            .execute(Available {
                check_in: Some(day(3)),
                check_out: Some(day(1)),
                ..Available::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::InvalidDateRange { .. },
        ));

        let err = svc
            .execute(Available {
                check_in: Some(day(3)),
                ..Available::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::IncompleteDateRange));
    }
}
