use criterion::{criterion_group, criterion_main, Criterion};
use serde_json::json;
use std::hint::black_box;
use wazo_google::models::raw_contact::{GDataEntry, Person};
use wazo_google::models::RawContact;
use wazo_google::services::ContactFormatter;

/// Synthetic address book: every contact has labeled and custom entries.
fn gdata_contacts(count: usize) -> Vec<RawContact> {
    (0..count)
        .map(|i| {
            let entry: GDataEntry = serde_json::from_value(json!({
                "id": {"$t": format!("http://www.google.com/m8/feeds/contacts/user%40example.com/base/{:016x}", i)},
                "title": {"$t": format!("Contact {}", i)},
                "gd$phoneNumber": [
                    {"rel": "http://schemas.google.com/g/2005#mobile", "$t": format!("+1 555-555-{:04}", i % 10000)},
                    {"rel": "http://schemas.google.com/g/2005#home", "$t": "(555) 555-1111"},
                    {"label": "Cottage", "$t": "555 555 2222"},
                    {"$t": "unlabeled"}
                ],
                "gd$email": [
                    {"rel": "http://schemas.google.com/g/2005#other", "address": format!("contact{}@example.com", i)},
                    {"label": "Old school", "address": format!("contact{}@caramail.com", i)}
                ]
            }))
            .expect("valid entry");
            RawContact::GData(entry)
        })
        .collect()
}

fn people_contacts(count: usize) -> Vec<RawContact> {
    (0..count)
        .map(|i| {
            let person: Person = serde_json::from_value(json!({
                "resourceName": format!("people/c{}", i),
                "names": [{"displayName": format!("Contact {}", i)}],
                "phoneNumbers": [
                    {"value": format!("+1 555-555-{:04}", i % 10000), "type": "mobile"},
                    {"value": "555 555 2222", "type": "Cottage"}
                ],
                "emailAddresses": [{"value": format!("contact{}@example.com", i), "type": "work"}]
            }))
            .expect("valid person");
            RawContact::People(person)
        })
        .collect()
}

fn benchmark_format(c: &mut Criterion) {
    let gdata = gdata_contacts(1000);
    let people = people_contacts(1000);

    let mut group = c.benchmark_group("contact_formatter");

    group.bench_function("gdata_1000_contacts", |b| {
        b.iter(|| {
            black_box(&gdata)
                .iter()
                .map(ContactFormatter::format)
                .count()
        })
    });

    group.bench_function("people_1000_contacts", |b| {
        b.iter(|| {
            black_box(&people)
                .iter()
                .map(ContactFormatter::format)
                .count()
        })
    });

    group.finish();
}

criterion_group!(benches, benchmark_format);
criterion_main!(benches);
