// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! Implementation of the quickcheck::Arbitrary trait for the model types.
use super::{DocumentKey, FieldPath, FieldValue, GeoPoint, ObjectValue, ServerTimestampValue};
use crate::timestamp::Timestamp;
use quickcheck::{Arbitrary, Gen};

// Skew the distribution to increase the likelihood of triggering bugs: most interesting
// behavior occurs when the same names show up in several paths of the same test.
const SEGMENTS: [&str; 5] = ["a", "b", "c", "d", "e.f"];

const MAX_DEPTH: usize = 2;

impl Arbitrary for Timestamp {
    fn arbitrary(g: &mut Gen) -> Timestamp {
        let range = Timestamp::MAX.seconds() - Timestamp::MIN.seconds();
        let seconds = Timestamp::MIN.seconds() + i64::arbitrary(g).rem_euclid(range);
        let nanos = (u32::arbitrary(g) % 1_000_000_000) as i32;
        Timestamp::new(seconds, nanos).expect("random timestamp is within accepted range")
    }

    fn shrink(&self) -> Box<dyn Iterator<Item = Self>> {
        let this = *self;
        let shrunk = [
            Timestamp::new(self.seconds(), 0).ok(),
            Timestamp::new(self.seconds() - self.seconds().rem_euclid(86_400), 0).ok(),
            Some(Timestamp::EPOCH),
        ]
        .into_iter()
        .flatten()
        // repeated calls to shrink must eventually end up with an empty result
        // so we make sure the shrunk stamps are always strictly smaller than 'self'
        .filter(move |x| x < &this);
        Box::new(shrunk)
    }
}

impl Arbitrary for DocumentKey {
    fn arbitrary(g: &mut Gen) -> Self {
        let collection = *g.choose(&["users", "rooms"]).unwrap();
        let id = *g.choose(&["alice", "bob", "eros"]).unwrap();
        DocumentKey::from_segments([collection, id]).expect("two non-empty segments")
    }
}

impl Arbitrary for FieldPath {
    fn arbitrary(g: &mut Gen) -> Self {
        let len = *g.choose(&[1, 1, 2, 2, 3]).unwrap();
        FieldPath::from_segments((0..len).map(|_| *g.choose(&SEGMENTS).unwrap()))
            .expect("at least one segment")
    }

    fn shrink(&self) -> Box<dyn Iterator<Item = Self>> {
        Box::new(self.pop_first().into_iter())
    }
}

impl Arbitrary for GeoPoint {
    fn arbitrary(g: &mut Gen) -> Self {
        GeoPoint::new(
            (i16::arbitrary(g) % 90).into(),
            (i16::arbitrary(g) % 180).into(),
        )
    }
}

fn arbitrary_value(g: &mut Gen, depth: usize) -> FieldValue {
    let mut choices = vec![
        "null",
        "boolean",
        "integer",
        "double",
        "timestamp",
        "server_timestamp",
        "string",
        "bytes",
        "reference",
        "geo_point",
    ];
    if depth < MAX_DEPTH {
        choices.extend(["array", "object"]);
    }
    match *g.choose(&choices).unwrap() {
        "null" => FieldValue::Null,
        "boolean" => FieldValue::Boolean(<_>::arbitrary(g)),
        "integer" => FieldValue::Integer(<_>::arbitrary(g)),
        "double" => FieldValue::Double(<_>::arbitrary(g)),
        "timestamp" => FieldValue::Timestamp(<_>::arbitrary(g)),
        "server_timestamp" => FieldValue::ServerTimestamp(ServerTimestampValue::new(
            <_>::arbitrary(g),
            bool::arbitrary(g).then(|| arbitrary_value(g, MAX_DEPTH)),
        )),
        "string" => FieldValue::String(<_>::arbitrary(g)),
        "bytes" => FieldValue::Bytes(<_>::arbitrary(g)),
        "reference" => FieldValue::Reference(<_>::arbitrary(g)),
        "geo_point" => FieldValue::GeoPoint(<_>::arbitrary(g)),
        "array" => {
            let len = usize::arbitrary(g) % 4;
            FieldValue::Array((0..len).map(|_| arbitrary_value(g, depth + 1)).collect())
        }
        "object" => FieldValue::Object(arbitrary_object(g, depth + 1)),
        _ => unreachable!(),
    }
}

fn arbitrary_object(g: &mut Gen, depth: usize) -> ObjectValue {
    let len = usize::arbitrary(g) % 4;
    (0..len)
        .map(|_| {
            (
                *g.choose(&SEGMENTS).unwrap(),
                arbitrary_value(g, depth),
            )
        })
        .collect()
}

impl Arbitrary for FieldValue {
    fn arbitrary(g: &mut Gen) -> Self {
        arbitrary_value(g, 0)
    }

    fn shrink(&self) -> Box<dyn Iterator<Item = Self>> {
        match self {
            FieldValue::Null => quickcheck::empty_shrinker(),
            FieldValue::Boolean(v) => Box::new(v.shrink().map(FieldValue::Boolean)),
            FieldValue::Integer(v) => Box::new(
                v.shrink()
                    .map(FieldValue::Integer)
                    .chain(std::iter::once(FieldValue::Null)),
            ),
            FieldValue::String(v) => Box::new(
                v.shrink()
                    .map(FieldValue::String)
                    .chain(std::iter::once(FieldValue::Null)),
            ),
            FieldValue::Array(values) => Box::new(
                values
                    .shrink()
                    .map(FieldValue::Array)
                    .chain(std::iter::once(FieldValue::Null)),
            ),
            FieldValue::Object(object) => {
                let children: Vec<_> = object.fields().map(|(_, v)| v.clone()).collect();
                Box::new(children.into_iter().chain(std::iter::once(FieldValue::Null)))
            }
            _ => quickcheck::single_shrinker(FieldValue::Null),
        }
    }
}

impl Arbitrary for ObjectValue {
    fn arbitrary(g: &mut Gen) -> Self {
        arbitrary_object(g, 0)
    }

    fn shrink(&self) -> Box<dyn Iterator<Item = Self>> {
        let this = self.clone();
        let names: Vec<String> = self.fields().map(|(k, _)| k.to_string()).collect();
        Box::new(
            names
                .into_iter()
                .map(move |name| this.delete(&FieldPath::single(name))),
        )
    }
}
