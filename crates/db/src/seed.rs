//! Development seed data.
//!
//! Each table is seeded only when it is empty, so running the seeder on
//! every start is safe.

use sqlx::PgPool;
use taskboard_core::roles::Role;

use crate::models::project::CreateProject;
use crate::models::user::CreateUser;
use crate::repositories::{ProjectRepo, UserRepo};

/// Email of the seeded administrator.
pub const ADMIN_EMAIL: &str = "admin@example.com";

const USERS: [(&str, &str, &str, Role); 3] = [
    ("Jack", "Doe", ADMIN_EMAIL, Role::Admin),
    ("Jane", "Doe", "jane.doe@example.com", Role::User),
    ("John", "Doe", "john.doe@example.com", Role::User),
];

const PROJECTS: [(&str, &str); 3] = [
    (
        "Website redesign",
        "Refresh the marketing site with the new brand guidelines.",
    ),
    (
        "Mobile app launch",
        "Ship the first public release of the mobile client.",
    ),
    (
        "Support tooling",
        "Internal dashboards for the customer support team.",
    ),
];

/// Rows inserted by [`seed_dev_data`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub users: usize,
    pub projects: usize,
}

/// Seed an admin, two users and three projects into empty tables.
///
/// Every seeded account gets `password_hash`.
pub async fn seed_dev_data(pool: &PgPool, password_hash: &str) -> Result<SeedReport, sqlx::Error> {
    let mut report = SeedReport::default();
    let mut tx = pool.begin().await?;

    if UserRepo::count(pool).await? == 0 {
        for (first_name, last_name, email, role) in USERS {
            UserRepo::create(
                &mut *tx,
                &CreateUser {
                    first_name: first_name.to_string(),
                    last_name: last_name.to_string(),
                    email: email.to_string(),
                    password_hash: password_hash.to_string(),
                    role,
                },
            )
            .await?;
            report.users += 1;
        }
        tracing::info!(count = report.users, "Users seeded");
    } else {
        tracing::info!("Users already seeded");
    }

    if ProjectRepo::count(pool).await? == 0 {
        for (title, description) in PROJECTS {
            ProjectRepo::create(
                &mut *tx,
                &CreateProject {
                    title: title.to_string(),
                    description: description.to_string(),
                },
            )
            .await?;
            report.projects += 1;
        }
        tracing::info!(count = report.projects, "Projects seeded");
    } else {
        tracing::info!("Projects already seeded");
    }

    tx.commit().await?;
    Ok(report)
}
