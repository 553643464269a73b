//! User directory data source
//!
//! The gRPC service reads users through the [`UserSource`] trait. The
//! bundled implementation, [`InMemoryDirectory`], holds a fixed collection
//! generated once at startup by [`DirectoryFixture`] and never mutated
//! afterwards, so concurrent calls can read it without locking.

use async_trait::async_trait;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::fmt;

use crate::proto;

/// Role held by a user within the directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Member,
    Admin,
    Guest,
}

impl Role {
    /// Every role, in declaration order
    pub const ALL: [Role; 3] = [Role::Member, Role::Admin, Role::Guest];
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Member => write!(f, "Member"),
            Self::Admin => write!(f, "Admin"),
            Self::Guest => write!(f, "Guest"),
        }
    }
}

impl From<Role> for proto::Role {
    fn from(role: Role) -> Self {
        match role {
            Role::Member => proto::Role::Member,
            Role::Admin => proto::Role::Admin,
            Role::Guest => proto::Role::Guest,
        }
    }
}

impl From<proto::Role> for Role {
    fn from(role: proto::Role) -> Self {
        match role {
            proto::Role::Member => Role::Member,
            proto::Role::Admin => Role::Admin,
            proto::Role::Guest => Role::Guest,
        }
    }
}

/// A single user record
///
/// Immutable once generated. `id` is unique and stable for the lifetime of
/// the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: i32,
    pub membership_id: i32,
    pub first_name: String,
    pub surname: String,
    pub email_address: String,
    pub role: Role,
}

/// Directory view: used by `ListUsers` and `StreamUsers`
impl From<&UserRecord> for proto::UserSummary {
    fn from(user: &UserRecord) -> Self {
        proto::UserSummary {
            id: user.id,
            membership_id: user.membership_id,
            first_name: user.first_name.clone(),
            surname: user.surname.clone(),
            email_address: user.email_address.clone(),
            role: proto::Role::from(user.role) as i32,
        }
    }
}

/// Detail view: used by `GetUserById`, never carries role or membership
impl From<&UserRecord> for proto::UserDetail {
    fn from(user: &UserRecord) -> Self {
        proto::UserDetail {
            id: user.id,
            first_name: user.first_name.clone(),
            surname: user.surname.clone(),
            email_address: user.email_address.clone(),
        }
    }
}

/// Read-only source of user records
///
/// `list` returns every record in a stable order; `get` looks up a single
/// record by id.
#[async_trait]
pub trait UserSource: Send + Sync + 'static {
    /// All records, in generation order
    async fn list(&self) -> Vec<UserRecord>;

    /// The record with the given id, if any
    async fn get(&self, id: i32) -> Option<UserRecord>;
}

/// Fixed-size in-memory directory
#[derive(Debug, Clone)]
pub struct InMemoryDirectory {
    users: Vec<UserRecord>,
}

impl InMemoryDirectory {
    /// Wrap an existing, already ordered collection
    pub fn new(users: Vec<UserRecord>) -> Self {
        Self { users }
    }

    /// Number of records held
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Whether the directory holds no records
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl UserSource for InMemoryDirectory {
    async fn list(&self) -> Vec<UserRecord> {
        self.users.clone()
    }

    async fn get(&self, id: i32) -> Option<UserRecord> {
        self.users.iter().find(|user| user.id == id).cloned()
    }
}

const FIRST_NAMES: &[&str] = &[
    "Ada", "Alan", "Barbara", "Claude", "Dennis", "Edsger", "Frances", "Grace", "Hedy", "Ivan",
    "Joan", "Ken", "Leslie", "Margaret", "Niklaus", "Radia", "Shafi", "Tim", "Whitfield",
    "Yukihiro",
];

const SURNAMES: &[&str] = &[
    "Lovelace", "Turing", "Liskov", "Shannon", "Ritchie", "Dijkstra", "Allen", "Hopper",
    "Lamarr", "Sutherland", "Clarke", "Thompson", "Lamport", "Hamilton", "Wirth", "Perlman",
    "Goldwasser", "Berners-Lee", "Diffie", "Matsumoto",
];

const EMAIL_DOMAINS: &[&str] = &["example.com", "example.org", "example.net"];

/// Deterministic synthetic directory generator
///
/// Ids are dense and start at 1. Membership ids fall in `1..=100`. The same
/// seed always yields the same records.
#[derive(Debug, Clone, Copy)]
pub struct DirectoryFixture {
    count: usize,
    seed: u64,
}

impl DirectoryFixture {
    /// Create a generator for `count` records from `seed`
    pub fn new(count: usize, seed: u64) -> Self {
        Self { count, seed }
    }

    /// Generate `count` records from `seed`
    pub fn generate(count: usize, seed: u64) -> Vec<UserRecord> {
        Self::new(count, seed).build()
    }

    /// Produce the records
    pub fn build(&self) -> Vec<UserRecord> {
        let mut rng = StdRng::seed_from_u64(self.seed);

        (1..=self.count)
            .map(|index| {
                let first_name = FIRST_NAMES[rng.random_range(0..FIRST_NAMES.len())];
                let surname = SURNAMES[rng.random_range(0..SURNAMES.len())];
                let domain = EMAIL_DOMAINS[rng.random_range(0..EMAIL_DOMAINS.len())];
                let membership_id = rng.random_range(1..=100);
                let role = Role::ALL[rng.random_range(0..Role::ALL.len())];

                UserRecord {
                    id: index as i32,
                    membership_id,
                    first_name: first_name.to_string(),
                    surname: surname.to_string(),
                    email_address: format!("{}.{}@{}", first_name, surname, domain)
                        .to_lowercase(),
                    role,
                }
            })
            .collect()
    }

    /// Build the in-memory directory directly
    pub fn into_directory(self) -> InMemoryDirectory {
        InMemoryDirectory::new(self.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_ids_are_dense_from_one() {
        let users = DirectoryFixture::generate(10, 7);
        let ids: Vec<i32> = users.iter().map(|u| u.id).collect();
        assert_eq!(ids, (1..=10).collect::<Vec<_>>());
    }

    #[test]
    fn test_fixture_is_deterministic_per_seed() {
        assert_eq!(
            DirectoryFixture::generate(10, 42),
            DirectoryFixture::generate(10, 42)
        );
    }

    #[test]
    fn test_fixture_field_ranges() {
        for user in DirectoryFixture::generate(50, 3) {
            assert!((1..=100).contains(&user.membership_id));
            assert!(!user.first_name.is_empty());
            assert!(!user.surname.is_empty());
            assert!(user.email_address.contains('@'));
            assert_eq!(user.email_address, user.email_address.to_lowercase());
        }
    }

    #[tokio::test]
    async fn test_in_memory_lookup() {
        let directory = DirectoryFixture::new(10, 1).into_directory();

        let user = directory.get(3).await.unwrap();
        assert_eq!(user.id, 3);
        assert!(directory.get(0).await.is_none());
        assert!(directory.get(11).await.is_none());
    }

    #[tokio::test]
    async fn test_list_preserves_generation_order() {
        let users = DirectoryFixture::generate(5, 9);
        let directory = InMemoryDirectory::new(users.clone());
        assert_eq!(directory.list().await, users);
        assert_eq!(directory.len(), 5);
    }

    #[test]
    fn test_role_names_survive_the_wire() {
        for role in Role::ALL {
            let wire = proto::Role::from(role);
            assert_eq!(Role::from(wire), role);
        }
        assert_eq!(Role::from(proto::Role::Guest).to_string(), "Guest");
    }

    #[test]
    fn test_detail_projection_drops_role_and_membership() {
        let user = UserRecord {
            id: 4,
            membership_id: 55,
            first_name: "Grace".to_string(),
            surname: "Hopper".to_string(),
            email_address: "grace.hopper@example.com".to_string(),
            role: Role::Admin,
        };

        let summary = proto::UserSummary::from(&user);
        assert_eq!(summary.membership_id, 55);
        assert_eq!(summary.role(), proto::Role::Admin);

        let detail = proto::UserDetail::from(&user);
        assert_eq!(detail.id, 4);
        assert_eq!(detail.first_name, "Grace");
        assert_eq!(detail.surname, "Hopper");
        assert_eq!(detail.email_address, "grace.hopper@example.com");
    }
}
