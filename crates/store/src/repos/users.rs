//! Users and organizations, including organization daily counters

use crate::codec::{amount, day, parse_day, ts};
use crate::error::{StoreError, StoreResult};
use crate::rows::{OrganizationRow, UserRow};
use chrono::{DateTime, NaiveDate, Utc};
use lus_core::{Amount, Organization, User};
use sqlx::SqliteConnection;

pub struct UserRepo;

impl UserRepo {
    pub async fn insert(conn: &mut SqliteConnection, user: &User, now: DateTime<Utc>) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO users (id, full_name, role, organization_id, country, is_pep, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&user.id)
        .bind(&user.full_name)
        .bind(user.role.to_string())
        .bind(&user.organization_id)
        .bind(&user.country)
        .bind(user.is_pep)
        .bind(ts(&now))
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    pub async fn get(conn: &mut SqliteConnection, id: &str) -> StoreResult<Option<User>> {
        sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .map(User::try_from)
            .transpose()
    }

    pub async fn require(conn: &mut SqliteConnection, id: &str) -> StoreResult<User> {
        Self::get(conn, id)
            .await?
            .ok_or_else(|| StoreError::not_found("User", id))
    }

    pub async fn list(conn: &mut SqliteConnection) -> StoreResult<Vec<User>> {
        sqlx::query_as::<_, UserRow>("SELECT * FROM users ORDER BY id")
            .fetch_all(&mut *conn)
            .await?
            .into_iter()
            .map(User::try_from)
            .collect()
    }

    pub async fn list_by_organization(conn: &mut SqliteConnection, organization_id: &str) -> StoreResult<Vec<User>> {
        sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE organization_id = ? ORDER BY id")
            .bind(organization_id)
            .fetch_all(&mut *conn)
            .await?
            .into_iter()
            .map(User::try_from)
            .collect()
    }
}

/// Today's collection and settlement usage of one organization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrganizationCounters {
    pub organization_id: String,
    pub daily_collected: Amount,
    pub daily_settlement_used: Amount,
    pub counters_date: NaiveDate,
}

impl OrganizationCounters {
    /// Collections not yet requested for settlement
    pub fn capacity(&self) -> Amount {
        self.daily_collected.saturating_sub(&self.daily_settlement_used)
    }
}

impl TryFrom<&OrganizationRow> for OrganizationCounters {
    type Error = StoreError;

    fn try_from(row: &OrganizationRow) -> StoreResult<Self> {
        Ok(OrganizationCounters {
            organization_id: row.id.clone(),
            daily_collected: amount(row.daily_collected_cents)?,
            daily_settlement_used: amount(row.daily_settlement_used_cents)?,
            counters_date: parse_day("organizations.counters_date", &row.counters_date)?,
        })
    }
}

pub struct OrganizationRepo;

impl OrganizationRepo {
    pub async fn insert(
        conn: &mut SqliteConnection,
        org: &Organization,
        now: DateTime<Utc>,
    ) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO organizations (id, name, counters_date, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&org.id)
        .bind(&org.name)
        .bind(day(&now.date_naive()))
        .bind(ts(&now))
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    pub async fn get(conn: &mut SqliteConnection, id: &str) -> StoreResult<Option<Organization>> {
        Ok(Self::row(conn, id).await?.map(Organization::from))
    }

    async fn row(conn: &mut SqliteConnection, id: &str) -> StoreResult<Option<OrganizationRow>> {
        Ok(
            sqlx::query_as::<_, OrganizationRow>("SELECT * FROM organizations WHERE id = ?")
                .bind(id)
                .fetch_optional(&mut *conn)
                .await?,
        )
    }

    /// Zero the daily counters if they belong to an earlier day.
    ///
    /// Compare-and-set on `counters_date`: of any number of concurrent callers on
    /// a new day exactly one observes `true`.
    pub async fn reset_counters_if_stale(
        conn: &mut SqliteConnection,
        id: &str,
        today: NaiveDate,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE organizations
             SET daily_collected_cents = 0, daily_settlement_used_cents = 0, counters_date = ?2
             WHERE id = ?1 AND counters_date < ?2",
        )
        .bind(id)
        .bind(day(&today))
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Counters as of `today`, resetting them first when stale.
    pub async fn counters(
        conn: &mut SqliteConnection,
        id: &str,
        today: NaiveDate,
    ) -> StoreResult<OrganizationCounters> {
        Self::reset_counters_if_stale(conn, id, today).await?;
        let row = Self::row(conn, id)
            .await?
            .ok_or_else(|| StoreError::not_found("Organization", id))?;
        OrganizationCounters::try_from(&row)
    }

    pub async fn add_collected(
        conn: &mut SqliteConnection,
        id: &str,
        collected: Amount,
        today: NaiveDate,
    ) -> StoreResult<()> {
        Self::reset_counters_if_stale(conn, id, today).await?;
        let result = sqlx::query(
            "UPDATE organizations SET daily_collected_cents = daily_collected_cents + ?2
             WHERE id = ?1 AND counters_date = ?3",
        )
        .bind(id)
        .bind(collected.to_cents()?)
        .bind(day(&today))
        .execute(&mut *conn)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Organization", id));
        }
        Ok(())
    }

    /// Consume settlement capacity in a single conditional update.
    ///
    /// Returns `false` (and changes nothing) when the remaining capacity is
    /// smaller than `requested`.
    pub async fn reserve_capacity(
        conn: &mut SqliteConnection,
        id: &str,
        requested: Amount,
        today: NaiveDate,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE organizations
             SET daily_settlement_used_cents = daily_settlement_used_cents + ?2
             WHERE id = ?1 AND counters_date = ?3
               AND daily_collected_cents - daily_settlement_used_cents >= ?2",
        )
        .bind(id)
        .bind(requested.to_cents()?)
        .bind(day(&today))
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Give back capacity reserved on `reserved_on`; a no-op once that day is over.
    pub async fn release_capacity(
        conn: &mut SqliteConnection,
        id: &str,
        released: Amount,
        reserved_on: NaiveDate,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE organizations
             SET daily_settlement_used_cents = MAX(daily_settlement_used_cents - ?2, 0)
             WHERE id = ?1 AND counters_date = ?3",
        )
        .bind(id)
        .bind(released.to_cents()?)
        .bind(day(&reserved_on))
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Store;
    use lus_core::UserRole;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_user_roundtrip() {
        let store = Store::in_memory().await.unwrap();
        let mut conn = store.acquire().await.unwrap();
        let now = Utc::now();
        OrganizationRepo::insert(
            &mut conn,
            &Organization { id: "ORG-1".into(), name: "Kiosk".into() },
            now,
        )
        .await
        .unwrap();
        let user = User::new("m-1", "Mary", UserRole::Merchant)
            .with_organization("ORG-1")
            .with_country("ke")
            .with_pep(true);
        UserRepo::insert(&mut conn, &user, now).await.unwrap();

        let loaded = UserRepo::require(&mut conn, "m-1").await.unwrap();
        assert_eq!(loaded, user);
        assert!(UserRepo::require(&mut conn, "nobody").await.unwrap_err().is_not_found());

        UserRepo::insert(&mut conn, &User::new("c-1", "Carl", UserRole::Customer), now)
            .await
            .unwrap();
        let members = UserRepo::list_by_organization(&mut conn, "ORG-1").await.unwrap();
        assert_eq!(members, vec![user]);
    }

    #[tokio::test]
    async fn test_capacity_reservation_is_conditional() {
        let store = Store::in_memory().await.unwrap();
        let mut conn = store.acquire().await.unwrap();
        let now = Utc::now();
        let today = now.date_naive();
        OrganizationRepo::insert(
            &mut conn,
            &Organization { id: "ORG-1".into(), name: "Kiosk".into() },
            now,
        )
        .await
        .unwrap();
        let amt = |v| Amount::new(v).unwrap();

        OrganizationRepo::add_collected(&mut conn, "ORG-1", amt(dec!(1000)), today).await.unwrap();
        assert!(OrganizationRepo::reserve_capacity(&mut conn, "ORG-1", amt(dec!(600)), today).await.unwrap());
        assert!(!OrganizationRepo::reserve_capacity(&mut conn, "ORG-1", amt(dec!(400.01)), today).await.unwrap());

        let counters = OrganizationRepo::counters(&mut conn, "ORG-1", today).await.unwrap();
        assert_eq!(counters.capacity(), amt(dec!(400)));

        OrganizationRepo::release_capacity(&mut conn, "ORG-1", amt(dec!(600)), today).await.unwrap();
        let counters = OrganizationRepo::counters(&mut conn, "ORG-1", today).await.unwrap();
        assert_eq!(counters.capacity(), amt(dec!(1000)));
    }

    #[tokio::test]
    async fn test_counters_reset_next_day() {
        let store = Store::in_memory().await.unwrap();
        let mut conn = store.acquire().await.unwrap();
        let now = Utc::now();
        let today = now.date_naive();
        OrganizationRepo::insert(
            &mut conn,
            &Organization { id: "ORG-1".into(), name: "Kiosk".into() },
            now,
        )
        .await
        .unwrap();
        OrganizationRepo::add_collected(&mut conn, "ORG-1", Amount::new(dec!(50)).unwrap(), today)
            .await
            .unwrap();

        let tomorrow = today.succ_opt().unwrap();
        assert!(OrganizationRepo::reset_counters_if_stale(&mut conn, "ORG-1", tomorrow).await.unwrap());
        assert!(!OrganizationRepo::reset_counters_if_stale(&mut conn, "ORG-1", tomorrow).await.unwrap());
        let counters = OrganizationRepo::counters(&mut conn, "ORG-1", tomorrow).await.unwrap();
        assert!(counters.daily_collected.is_zero());
        assert_eq!(counters.counters_date, tomorrow);
    }
}
