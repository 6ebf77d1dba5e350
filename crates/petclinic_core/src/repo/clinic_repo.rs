//! Clinic repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide lookup and upsert APIs over owners, pets, types, vets, visits.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Saving an entity without id inserts it; with id, updates it in place.
//! - Saves cascade downward (owner -> pets -> visits) inside one transaction.
//! - No two stored pets of one owner share a [`pet_name_key`].
//! - Assigned ids reach the caller's value only after commit.
//! - Loaded collections are ordered deterministically:
//!   pets by `name, id`, visits by `visit_date DESC, id DESC`,
//!   specialties by `name, id`.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::owner::Owner;
use crate::model::pet::{pet_name_key, Pet, PetType};
use crate::model::vet::{Specialty, Vet};
use crate::model::visit::Visit;
use crate::model::{EntityId, EntityKind, ValidationError};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

const DATE_FORMAT: &str = "%Y-%m-%d";

const OWNER_SELECT_SQL: &str = "SELECT
    id,
    first_name,
    last_name,
    address,
    city,
    telephone
FROM owners";

const PET_SELECT_SQL: &str = "SELECT
    p.id AS id,
    p.name AS name,
    p.birth_date AS birth_date,
    p.owner_id AS owner_id,
    t.id AS type_id,
    t.name AS type_name
FROM pets p
INNER JOIN types t ON t.id = p.type_id";

const VISIT_SELECT_SQL: &str = "SELECT
    id,
    pet_id,
    visit_date,
    description
FROM visits";

const REQUIRED_TABLES: [&str; 7] = [
    "owners",
    "pets",
    "types",
    "visits",
    "vets",
    "specialties",
    "vet_specialties",
];

pub type RepoResult<T> = Result<T, RepoError>;

/// Errors from clinic persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Update or reference target does not exist.
    NotFound { entity: EntityKind, id: EntityId },
    /// Model rule violated; nothing was written.
    Validation(ValidationError),
    /// Persisted data cannot be converted to a valid model.
    InvalidData(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted clinic data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "clinic repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "clinic repository requires table `{table}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::NotFound { .. } => None,
            Self::InvalidData(_) => None,
            Self::UninitializedConnection { .. } => None,
            Self::MissingRequiredTable(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

/// How `find_owners_by_last_name` compares the query to stored surnames.
///
/// All modes are case-sensitive. An empty query matches every owner in
/// `Prefix` and `Contains` mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LastNameMatch {
    /// Stored surname starts with the query.
    #[default]
    Prefix,
    /// Stored surname equals the query.
    Exact,
    /// Stored surname contains the query anywhere.
    Contains,
}

impl LastNameMatch {
    /// Parses a config value (`prefix`, `exact`, `contains`).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "prefix" => Some(Self::Prefix),
            "exact" => Some(Self::Exact),
            "contains" => Some(Self::Contains),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Prefix => "prefix",
            Self::Exact => "exact",
            Self::Contains => "contains",
        }
    }

    // Plain comparisons instead of LIKE: no wildcard escaping, no ASCII case folding.
    fn sql_predicate(self) -> &'static str {
        match self {
            Self::Prefix => "substr(last_name, 1, length(?1)) = ?1",
            Self::Exact => "last_name = ?1",
            Self::Contains => "instr(last_name, ?1) > 0",
        }
    }
}

/// Storage contract consumed by `ClinicService`.
pub trait ClinicRepository {
    /// Owners whose surname matches, each with pets, types and visits loaded.
    fn find_owners_by_last_name(
        &self,
        last_name: &str,
        mode: LastNameMatch,
    ) -> RepoResult<Vec<Owner>>;
    /// One owner with pets, types and visits loaded.
    fn find_owner_by_id(&self, id: EntityId) -> RepoResult<Option<Owner>>;
    /// Upserts the owner and cascades to its pets and their visits.
    fn save_owner(&self, owner: &mut Owner) -> RepoResult<EntityId>;
    /// All pet types ordered by name.
    fn find_pet_types(&self) -> RepoResult<Vec<PetType>>;
    /// One pet with type and visits loaded.
    fn find_pet_by_id(&self, id: EntityId) -> RepoResult<Option<Pet>>;
    /// Upserts the pet under its owner and cascades to its visits.
    fn save_pet(&self, pet: &mut Pet) -> RepoResult<EntityId>;
    /// Upserts one visit of an existing pet.
    fn save_visit(&self, visit: &mut Visit) -> RepoResult<EntityId>;
    /// Visits of one pet, newest first.
    fn find_visits_by_pet_id(&self, pet_id: EntityId) -> RepoResult<Vec<Visit>>;
    /// All vets with their specialties.
    fn find_vets(&self) -> RepoResult<Vec<Vet>>;
}

/// SQLite-backed clinic repository.
pub struct SqliteClinicRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteClinicRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_clinic_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl ClinicRepository for SqliteClinicRepository<'_> {
    fn find_owners_by_last_name(
        &self,
        last_name: &str,
        mode: LastNameMatch,
    ) -> RepoResult<Vec<Owner>> {
        let sql = format!(
            "{OWNER_SELECT_SQL}
             WHERE {}
             ORDER BY id ASC;",
            mode.sql_predicate()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([last_name])?;

        let mut owners = Vec::new();
        while let Some(row) = rows.next()? {
            let mut owner = parse_owner_row(row)?;
            owner.pets = load_pets_for_owner(self.conn, row.get("id")?)?;
            owners.push(owner);
        }
        Ok(owners)
    }

    fn find_owner_by_id(&self, id: EntityId) -> RepoResult<Option<Owner>> {
        let owner = self
            .conn
            .query_row(
                &format!("{OWNER_SELECT_SQL} WHERE id = ?1;"),
                [id],
                |row| Ok(parse_owner_row(row)),
            )
            .optional()?
            .transpose()?;

        match owner {
            Some(mut owner) => {
                owner.pets = load_pets_for_owner(self.conn, id)?;
                Ok(Some(owner))
            }
            None => Ok(None),
        }
    }

    fn save_owner(&self, owner: &mut Owner) -> RepoResult<EntityId> {
        owner.validate()?;

        let mut staged = owner.clone();
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let id = write_owner(&tx, &mut staged)?;
        tx.commit()?;

        *owner = staged;
        Ok(id)
    }

    fn find_pet_types(&self) -> RepoResult<Vec<PetType>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM types ORDER BY name ASC, id ASC;")?;
        let mut rows = stmt.query([])?;
        let mut types = Vec::new();
        while let Some(row) = rows.next()? {
            types.push(PetType::with_id(
                row.get::<_, EntityId>("id")?,
                row.get::<_, String>("name")?,
            ));
        }
        Ok(types)
    }

    fn find_pet_by_id(&self, id: EntityId) -> RepoResult<Option<Pet>> {
        let pet = self
            .conn
            .query_row(
                &format!("{PET_SELECT_SQL} WHERE p.id = ?1;"),
                [id],
                |row| Ok(parse_pet_row(row)),
            )
            .optional()?
            .transpose()?;

        match pet {
            Some(mut pet) => {
                pet.visits = load_visits_for_pet(self.conn, id)?;
                Ok(Some(pet))
            }
            None => Ok(None),
        }
    }

    fn save_pet(&self, pet: &mut Pet) -> RepoResult<EntityId> {
        pet.validate()?;

        let mut staged = pet.clone();
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let id = write_pet(&tx, &mut staged)?;
        tx.commit()?;

        *pet = staged;
        Ok(id)
    }

    fn save_visit(&self, visit: &mut Visit) -> RepoResult<EntityId> {
        visit.validate()?;

        let mut staged = visit.clone();
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let id = write_visit(&tx, &mut staged)?;
        tx.commit()?;

        *visit = staged;
        Ok(id)
    }

    fn find_visits_by_pet_id(&self, pet_id: EntityId) -> RepoResult<Vec<Visit>> {
        load_visits_for_pet(self.conn, pet_id)
    }

    fn find_vets(&self) -> RepoResult<Vec<Vet>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                v.id AS vet_id,
                v.first_name AS first_name,
                v.last_name AS last_name,
                s.id AS specialty_id,
                s.name AS specialty_name
             FROM vets v
             LEFT JOIN vet_specialties vs ON vs.vet_id = v.id
             LEFT JOIN specialties s ON s.id = vs.specialty_id
             ORDER BY v.last_name ASC, v.first_name ASC, v.id ASC, s.name ASC, s.id ASC;",
        )?;
        let mut rows = stmt.query([])?;

        let mut vets: Vec<Vet> = Vec::new();
        while let Some(row) = rows.next()? {
            let vet_id: EntityId = row.get("vet_id")?;
            let is_same_vet = vets.last().is_some_and(|vet| vet.id == Some(vet_id));
            if !is_same_vet {
                let mut vet = Vet::new(
                    row.get::<_, String>("first_name")?,
                    row.get::<_, String>("last_name")?,
                );
                vet.id = Some(vet_id);
                vets.push(vet);
            }

            let specialty_id: Option<EntityId> = row.get("specialty_id")?;
            if let (Some(specialty_id), Some(vet)) = (specialty_id, vets.last_mut()) {
                let name: String = row.get("specialty_name")?;
                vet.add_specialty(Specialty::with_id(specialty_id, name));
            }
        }
        Ok(vets)
    }
}

fn write_owner(conn: &Connection, owner: &mut Owner) -> RepoResult<EntityId> {
    let id = match owner.id {
        None => {
            conn.execute(
                "INSERT INTO owners (
                    first_name,
                    last_name,
                    address,
                    city,
                    telephone
                ) VALUES (?1, ?2, ?3, ?4, ?5);",
                params![
                    owner.first_name.as_str(),
                    owner.last_name.as_str(),
                    owner.address.as_str(),
                    owner.city.as_str(),
                    owner.telephone.as_str(),
                ],
            )?;
            conn.last_insert_rowid()
        }
        Some(id) => {
            let changed = conn.execute(
                "UPDATE owners
                 SET
                    first_name = ?2,
                    last_name = ?3,
                    address = ?4,
                    city = ?5,
                    telephone = ?6
                 WHERE id = ?1;",
                params![
                    id,
                    owner.first_name.as_str(),
                    owner.last_name.as_str(),
                    owner.address.as_str(),
                    owner.city.as_str(),
                    owner.telephone.as_str(),
                ],
            )?;
            if changed == 0 {
                return Err(RepoError::NotFound {
                    entity: EntityKind::Owner,
                    id,
                });
            }
            id
        }
    };
    owner.id = Some(id);

    for pet in &mut owner.pets {
        pet.owner_id = Some(id);
        write_pet(conn, pet)?;
    }
    Ok(id)
}

fn write_pet(conn: &Connection, pet: &mut Pet) -> RepoResult<EntityId> {
    let owner_id = pet.owner_id.ok_or(ValidationError::Unassigned {
        entity: EntityKind::Pet,
        parent: EntityKind::Owner,
    })?;
    let type_id = pet
        .pet_type
        .id
        .ok_or_else(|| ValidationError::UnsavedPetType(pet.pet_type.name.clone()))?;
    ensure_exists(conn, EntityKind::Owner, owner_id)?;
    ensure_exists(conn, EntityKind::PetType, type_id)?;
    ensure_unique_pet_name(conn, owner_id, pet)?;

    let birth_date = date_to_db(pet.birth_date);
    let id = match pet.id {
        None => {
            conn.execute(
                "INSERT INTO pets (
                    name,
                    birth_date,
                    type_id,
                    owner_id
                ) VALUES (?1, ?2, ?3, ?4);",
                params![pet.name.as_str(), birth_date, type_id, owner_id],
            )?;
            conn.last_insert_rowid()
        }
        Some(id) => {
            let changed = conn.execute(
                "UPDATE pets
                 SET
                    name = ?2,
                    birth_date = ?3,
                    type_id = ?4,
                    owner_id = ?5
                 WHERE id = ?1;",
                params![id, pet.name.as_str(), birth_date, type_id, owner_id],
            )?;
            if changed == 0 {
                return Err(RepoError::NotFound {
                    entity: EntityKind::Pet,
                    id,
                });
            }
            id
        }
    };
    pet.id = Some(id);

    for visit in &mut pet.visits {
        visit.pet_id = Some(id);
        write_visit(conn, visit)?;
    }
    Ok(id)
}

// SQLite `lower()` only folds ASCII, so keys are compared on this side.
fn ensure_unique_pet_name(conn: &Connection, owner_id: EntityId, pet: &Pet) -> RepoResult<()> {
    let key = pet_name_key(&pet.name);
    let mut stmt = conn.prepare("SELECT name FROM pets WHERE owner_id = ?1 AND id IS NOT ?2;")?;
    let mut rows = stmt.query(params![owner_id, pet.id])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(0)?;
        if pet_name_key(&name) == key {
            return Err(ValidationError::DuplicatePetName(pet.name.clone()).into());
        }
    }
    Ok(())
}

fn write_visit(conn: &Connection, visit: &mut Visit) -> RepoResult<EntityId> {
    let pet_id = visit.pet_id.ok_or(ValidationError::Unassigned {
        entity: EntityKind::Visit,
        parent: EntityKind::Pet,
    })?;
    ensure_exists(conn, EntityKind::Pet, pet_id)?;

    let visit_date = date_to_db(visit.date);
    let id = match visit.id {
        None => {
            conn.execute(
                "INSERT INTO visits (
                    pet_id,
                    visit_date,
                    description
                ) VALUES (?1, ?2, ?3);",
                params![pet_id, visit_date, visit.description.as_str()],
            )?;
            conn.last_insert_rowid()
        }
        Some(id) => {
            let changed = conn.execute(
                "UPDATE visits
                 SET
                    pet_id = ?2,
                    visit_date = ?3,
                    description = ?4
                 WHERE id = ?1;",
                params![id, pet_id, visit_date, visit.description.as_str()],
            )?;
            if changed == 0 {
                return Err(RepoError::NotFound {
                    entity: EntityKind::Visit,
                    id,
                });
            }
            id
        }
    };
    visit.id = Some(id);
    Ok(id)
}

fn load_pets_for_owner(conn: &Connection, owner_id: EntityId) -> RepoResult<Vec<Pet>> {
    let mut stmt = conn.prepare(&format!(
        "{PET_SELECT_SQL}
         WHERE p.owner_id = ?1
         ORDER BY p.name ASC, p.id ASC;"
    ))?;
    let mut rows = stmt.query([owner_id])?;
    let mut pets = Vec::new();
    while let Some(row) = rows.next()? {
        let mut pet = parse_pet_row(row)?;
        pet.visits = load_visits_for_pet(conn, row.get("id")?)?;
        pets.push(pet);
    }
    Ok(pets)
}

fn load_visits_for_pet(conn: &Connection, pet_id: EntityId) -> RepoResult<Vec<Visit>> {
    let mut stmt = conn.prepare(&format!(
        "{VISIT_SELECT_SQL}
         WHERE pet_id = ?1
         ORDER BY visit_date DESC, id DESC;"
    ))?;
    let mut rows = stmt.query([pet_id])?;
    let mut visits = Vec::new();
    while let Some(row) = rows.next()? {
        visits.push(parse_visit_row(row)?);
    }
    Ok(visits)
}

fn parse_owner_row(row: &Row<'_>) -> RepoResult<Owner> {
    let mut owner = Owner::new(
        row.get::<_, String>("first_name")?,
        row.get::<_, String>("last_name")?,
        row.get::<_, String>("address")?,
        row.get::<_, String>("city")?,
        row.get::<_, String>("telephone")?,
    );
    owner.id = Some(row.get("id")?);
    Ok(owner)
}

fn parse_pet_row(row: &Row<'_>) -> RepoResult<Pet> {
    let birth_date_text: String = row.get("birth_date")?;
    let birth_date = parse_date(&birth_date_text, "pets.birth_date")?;
    let pet_type = PetType::with_id(
        row.get::<_, EntityId>("type_id")?,
        row.get::<_, String>("type_name")?,
    );

    let mut pet = Pet::new(row.get::<_, String>("name")?, pet_type, birth_date);
    pet.id = Some(row.get("id")?);
    pet.owner_id = Some(row.get("owner_id")?);
    Ok(pet)
}

fn parse_visit_row(row: &Row<'_>) -> RepoResult<Visit> {
    let date_text: String = row.get("visit_date")?;
    let date = parse_date(&date_text, "visits.visit_date")?;

    let mut visit = Visit::on(date, row.get::<_, String>("description")?);
    visit.id = Some(row.get("id")?);
    visit.pet_id = Some(row.get("pet_id")?);
    Ok(visit)
}

fn date_to_db(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn parse_date(value: &str, column: &'static str) -> RepoResult<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|_| RepoError::InvalidData(format!("invalid date value `{value}` in {column}")))
}

fn ensure_exists(conn: &Connection, entity: EntityKind, id: EntityId) -> RepoResult<()> {
    let table = match entity {
        EntityKind::Owner => "owners",
        EntityKind::Pet => "pets",
        EntityKind::PetType => "types",
        EntityKind::Specialty => "specialties",
        EntityKind::Vet => "vets",
        EntityKind::Visit => "visits",
    };
    let exists: i64 = conn.query_row(
        &format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE id = ?1);"),
        [id],
        |row| row.get(0),
    )?;
    if exists == 1 {
        Ok(())
    } else {
        Err(RepoError::NotFound { entity, id })
    }
}

fn ensure_clinic_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for table in REQUIRED_TABLES {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

#[cfg(test)]
mod tests {
    use super::{date_to_db, parse_date, LastNameMatch, RepoError};
    use chrono::NaiveDate;

    #[test]
    fn last_name_match_parses_config_values() {
        assert_eq!(LastNameMatch::parse(" Exact "), Some(LastNameMatch::Exact));
        assert_eq!(
            LastNameMatch::parse("contains"),
            Some(LastNameMatch::Contains)
        );
        assert_eq!(LastNameMatch::parse("like"), None);
        assert_eq!(LastNameMatch::default().as_str(), "prefix");
    }

    #[test]
    fn dates_use_iso_calendar_text() {
        let date = NaiveDate::from_ymd_opt(1995, 9, 4).unwrap();
        assert_eq!(date_to_db(date), "1995-09-04");
        assert_eq!(parse_date("1995-09-04", "pets.birth_date").unwrap(), date);
    }

    #[test]
    fn malformed_date_is_invalid_data() {
        let err = parse_date("04/09/1995", "visits.visit_date").unwrap_err();
        assert!(matches!(err, RepoError::InvalidData(message) if message.contains("visits.visit_date")));
    }
}
