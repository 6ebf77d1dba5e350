use chrono::NaiveDate;
use petclinic_core::db::{open_db_in_memory, seed_sample_data};
use petclinic_core::{
    find_by_id, ClinicService, ClinicServiceError, EntityKind, Owner, Pet, SqliteClinicRepository,
    Visit,
};
use rusqlite::Connection;

fn setup() -> Connection {
    let mut conn = open_db_in_memory().unwrap();
    seed_sample_data(&mut conn).unwrap();
    conn
}

fn service(conn: &Connection) -> ClinicService<SqliteClinicRepository<'_>> {
    ClinicService::new(SqliteClinicRepository::try_new(conn).unwrap())
}

#[test]
fn finds_owners_by_last_name() {
    let conn = setup();
    let service = service(&conn);

    let owners = service.find_owner_by_last_name("Davis").unwrap();
    assert_eq!(owners.len(), 2);

    let owners = service.find_owner_by_last_name("Daviss").unwrap();
    assert!(owners.is_empty());
}

#[test]
fn finds_single_owner_with_pets() {
    let conn = setup();
    let service = service(&conn);

    let owner1 = service.find_owner_by_id(1).unwrap();
    assert!(owner1.last_name.starts_with("Franklin"));
    assert_eq!(owner1.pets.len(), 1);

    let owner10 = service.find_owner_by_id(10).unwrap();
    assert_eq!(owner10.first_name, "Carlos");
    assert_eq!(owner10.pets.len(), 1);
}

#[test]
fn missing_owner_is_not_found() {
    let conn = setup();
    let service = service(&conn);

    let err = service.find_owner_by_id(999).unwrap_err();
    assert!(matches!(
        err,
        ClinicServiceError::NotFound {
            entity: EntityKind::Owner,
            id: 999
        }
    ));
}

#[test]
fn inserts_owner_and_assigns_id() {
    let conn = setup();
    let service = service(&conn);

    let found = service.find_owner_by_last_name("Schultz").unwrap().len();
    let mut owner = Owner::new("Sam", "Schultz", "4, Evans Street", "Wollongong", "4444444444");
    let id = service.save_owner(&mut owner).unwrap();

    assert_eq!(owner.id, Some(id));
    assert_ne!(id, 0);
    let owners = service.find_owner_by_last_name("Schultz").unwrap();
    assert_eq!(owners.len(), found + 1);
}

#[test]
fn updates_owner_last_name() {
    let conn = setup();
    let service = service(&conn);

    let mut owner = service.find_owner_by_id(1).unwrap();
    let old = owner.last_name.clone();
    owner.last_name = format!("{old}X");
    service.save_owner(&mut owner).unwrap();

    let owner = service.find_owner_by_id(1).unwrap();
    assert_eq!(owner.last_name, format!("{old}X"));
}

#[test]
fn finds_pet_with_type_and_owner() {
    let conn = setup();
    let service = service(&conn);
    let types = service.find_pet_types().unwrap();

    let pet7 = service.find_pet_by_id(7).unwrap();
    assert!(pet7.pet.name.starts_with("Samantha"));
    assert_eq!(find_by_id(&types, 1).unwrap().id, pet7.pet.pet_type.id);
    assert_eq!(pet7.owner.first_name, "Jean");

    let pet6 = service.find_pet_by_id(6).unwrap();
    assert_eq!(pet6.pet.name, "George");
    assert_eq!(find_by_id(&types, 4).unwrap().id, pet6.pet.pet_type.id);
    assert_eq!(pet6.owner.first_name, "Peter");
}

#[test]
fn missing_pet_is_not_found() {
    let conn = setup();
    let service = service(&conn);

    let err = service.find_pet_by_id(404).unwrap_err();
    assert!(matches!(
        err,
        ClinicServiceError::NotFound {
            entity: EntityKind::Pet,
            id: 404
        }
    ));
}

#[test]
fn finds_all_pet_types() {
    let conn = setup();
    let service = service(&conn);

    let types = service.find_pet_types().unwrap();
    assert_eq!(find_by_id(&types, 1).unwrap().name, "cat");
    assert_eq!(find_by_id(&types, 4).unwrap().name, "snake");
    assert_eq!(types.len(), 6);
}

#[test]
fn inserts_pet_through_owner_and_generates_id() {
    let conn = setup();
    let service = service(&conn);

    let mut owner6 = service.find_owner_by_id(6).unwrap();
    let found = owner6.pets.len();
    let types = service.find_pet_types().unwrap();
    let dog = find_by_id(&types, 2).unwrap().clone();
    owner6.add_pet(Pet::new(
        "bowser",
        dog,
        NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
    ));
    assert_eq!(owner6.pets.len(), found + 1);

    service.save_owner(&mut owner6).unwrap();
    assert!(owner6.pet("bowser", true).is_some());

    let owner6 = service.find_owner_by_id(6).unwrap();
    assert_eq!(owner6.pets.len(), found + 1);
}

#[test]
fn inserts_pet_directly_under_existing_owner() {
    let conn = setup();
    let service = service(&conn);

    let types = service.find_pet_types().unwrap();
    let mut pet = Pet::new(
        "Nibbles",
        find_by_id(&types, 6).unwrap().clone(),
        NaiveDate::from_ymd_opt(2023, 7, 1).unwrap(),
    );
    pet.owner_id = Some(3);
    let id = service.save_pet(&mut pet).unwrap();

    assert_eq!(pet.id, Some(id));
    let details = service.find_pet_by_id(id).unwrap();
    assert_eq!(details.owner.last_name, "Rodriquez");
    assert_eq!(details.owner.pets.len(), 3);
}

#[test]
fn updates_pet_name() {
    let conn = setup();
    let service = service(&conn);

    let mut pet7 = service.find_pet_by_id(7).unwrap().pet;
    let old = pet7.name.clone();
    pet7.name = format!("{old}X");
    service.save_pet(&mut pet7).unwrap();

    let pet7 = service.find_pet_by_id(7).unwrap().pet;
    assert_eq!(pet7.name, format!("{old}X"));
}

#[test]
fn finds_vets_with_ordered_specialties() {
    let conn = setup();
    let service = service(&conn);

    let vets = service.find_vets().unwrap();

    let leary = find_by_id(&vets, 2).unwrap();
    assert_eq!(leary.last_name, "Leary");
    assert_eq!(leary.nr_of_specialties(), 1);
    assert_eq!(leary.specialties()[0].name, "radiology");

    let douglas = find_by_id(&vets, 3).unwrap();
    assert_eq!(douglas.last_name, "Douglas");
    assert_eq!(douglas.nr_of_specialties(), 2);
    assert_eq!(douglas.specialties()[0].name, "dentistry");
    assert_eq!(douglas.specialties()[1].name, "surgery");

    let carter = find_by_id(&vets, 1).unwrap();
    assert_eq!(carter.nr_of_specialties(), 0);
}

#[test]
fn adds_new_visit_for_pet() {
    let conn = setup();
    let service = service(&conn);

    let pet7 = service.find_pet_by_id(7).unwrap().pet;
    let found = pet7.visits.len();
    let mut visit = Visit::new("test");
    visit.pet_id = pet7.id;
    service.save_visit(&mut visit).unwrap();

    let pet7 = service.find_pet_by_id(7).unwrap().pet;
    assert_eq!(pet7.visits.len(), found + 1);
    assert!(visit.id.is_some());
}

#[test]
fn adds_visit_through_pet_cascade() {
    let conn = setup();
    let service = service(&conn);

    let mut pet8 = service.find_pet_by_id(8).unwrap().pet;
    let found = pet8.visits.len();
    pet8.add_visit(Visit::on(
        NaiveDate::from_ymd_opt(2012, 1, 15).unwrap(),
        "dental cleaning",
    ));
    service.save_pet(&mut pet8).unwrap();

    assert!(pet8.visits.iter().all(|visit| visit.id.is_some()));
    let visits = service.find_visits_by_pet_id(8).unwrap();
    assert_eq!(visits.len(), found + 1);
    assert_eq!(visits[0].description, "dental cleaning");
}

#[test]
fn visit_for_unknown_pet_is_not_found() {
    let conn = setup();
    let service = service(&conn);

    let mut visit = Visit::new("orphan");
    visit.pet_id = Some(999);
    let err = service.save_visit(&mut visit).unwrap_err();

    assert!(matches!(
        err,
        ClinicServiceError::NotFound {
            entity: EntityKind::Pet,
            id: 999
        }
    ));
    assert!(visit.id.is_none());
}

#[test]
fn visits_by_pet_are_newest_first_and_empty_for_unknown_pet() {
    let conn = setup();
    let service = service(&conn);

    let visits = service.find_visits_by_pet_id(8).unwrap();
    let descriptions: Vec<&str> = visits.iter().map(|v| v.description.as_str()).collect();
    assert_eq!(descriptions, vec!["rabies shot", "neutered"]);

    assert!(service.find_visits_by_pet_id(999).unwrap().is_empty());
}
