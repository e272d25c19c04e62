//! Transport request entity, its editable fields and validation
use super::error::{FieldError, WorkflowError};
use super::role::UserId;
use super::status::Status;
use chrono::{DateTime, Datelike, TimeZone, Utc};
use std::fmt;
use std::str::FromStr;

pub type RequestId = u64;

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportType {
    #[n(0)]
    Truck,
    #[n(1)]
    Rail,
    #[n(2)]
    Air,
    #[n(3)]
    Sea,
    #[n(4)]
    Courier,
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Urgency {
    #[n(0)]
    Low,
    #[n(1)]
    Normal,
    #[n(2)]
    High,
    #[n(3)]
    Critical,
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
pub struct TimeStamp(DateTime<Utc>);

impl TimeStamp {
    pub fn now() -> Self {
        Self(Utc::now())
    }
    pub fn new_with(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> Option<Self> {
        Utc.with_ymd_and_hms(year, month, day, hour, min, sec)
            .single()
            .map(Self)
    }
    pub fn to_datetime_utc(&self) -> DateTime<Utc> {
        self.0
    }
    pub fn year(&self) -> i32 {
        self.0.year()
    }
}

impl From<DateTime<Utc>> for TimeStamp {
    fn from(value: DateTime<Utc>) -> Self {
        TimeStamp(value)
    }
}

impl<C> minicbor::Encode<C> for TimeStamp {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        if let Some(nsec) = self.0.timestamp_nanos_opt() {
            return e.i64(nsec)?.ok();
        }

        Err(minicbor::encode::Error::message(
            "failed to encode timestamp. timestamp_nanos_opt returned None",
        ))
    }
}

impl<'b, C> minicbor::Decode<'b, C> for TimeStamp {
    fn decode(d: &mut minicbor::Decoder<'b>, _: &mut C) -> Result<Self, minicbor::decode::Error> {
        let nsecs = d.i64()?;

        Ok(TimeStamp(DateTime::from_timestamp_nanos(nsecs)))
    }
}

/// Human-readable `TR-<year>-<seq>` number, sequential per calendar year.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestNumber {
    #[n(0)]
    pub year: i32,
    #[n(1)]
    pub seq: u32,
}

impl RequestNumber {
    pub const PREFIX: &'static str = "TR";

    pub fn new(year: i32, seq: u32) -> Self {
        Self { year, seq }
    }
}

impl fmt::Display for RequestNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{:03}", Self::PREFIX, self.year, self.seq)
    }
}

impl FromStr for RequestNumber {
    type Err = FieldError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let malformed = || FieldError::new("request_number", format!("malformed `{value}`"));

        let mut parts = value.trim().splitn(3, '-');
        if parts.next() != Some(Self::PREFIX) {
            return Err(malformed());
        }
        let year = parts
            .next()
            .and_then(|y| y.parse::<i32>().ok())
            .ok_or_else(malformed)?;
        let seq = parts
            .next()
            .and_then(|s| s.parse::<u32>().ok())
            .filter(|seq| *seq > 0)
            .ok_or_else(malformed)?;

        Ok(Self { year, seq })
    }
}

/// Route and cargo content supplied by the creator.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestFields {
    #[n(0)]
    pub origin_city: String,
    #[n(1)]
    pub origin_address: Option<String>,
    #[n(2)]
    pub destination_city: String,
    #[n(3)]
    pub destination_address: Option<String>,
    #[n(4)]
    pub cargo_type: String,
    #[n(5)]
    pub weight_kg: u64,
    #[n(6)]
    pub dimensions: Option<String>,
    #[n(7)]
    pub description: Option<String>,
}

/// Filled in progressively as the request moves down the chain.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Default, PartialEq, Eq)]
pub struct LogisticsDetails {
    #[n(0)]
    pub estimated_cost: Option<u64>, // integer minor units
    #[n(1)]
    pub transport_type: Option<TransportType>,
    #[n(2)]
    pub carrier: Option<String>,
    #[n(3)]
    pub urgency: Option<Urgency>,
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub struct Request {
    #[n(0)]
    pub id: RequestId,
    #[n(1)]
    pub number: RequestNumber,
    #[n(2)]
    pub fields: RequestFields,
    #[n(3)]
    pub logistics: LogisticsDetails,
    #[n(4)]
    pub status: Status,
    #[n(5)]
    pub created_by: UserId,
    #[n(6)]
    pub created_at: TimeStamp,
    #[n(7)]
    pub updated_at: TimeStamp,
    #[n(8)]
    pub revision: u64,
}

impl RequestFields {
    /// Construct an empty draft to fill in with the setters
    pub fn new() -> Self {
        Self::default()
    }
    pub fn set_origin(mut self, city: &str, address: Option<&str>) -> Self {
        self.origin_city = city.to_owned();
        self.origin_address = address.map(str::to_owned);
        self
    }
    pub fn set_destination(mut self, city: &str, address: Option<&str>) -> Self {
        self.destination_city = city.to_owned();
        self.destination_address = address.map(str::to_owned);
        self
    }
    pub fn set_cargo_type(mut self, cargo_type: &str) -> Self {
        self.cargo_type = cargo_type.to_owned();
        self
    }
    pub fn set_weight_kg(mut self, weight: u64) -> Self {
        self.weight_kg = weight;
        self
    }
    pub fn set_dimensions(mut self, dimensions: &str) -> Self {
        self.dimensions = Some(dimensions.to_owned());
        self
    }
    pub fn set_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_owned());
        self
    }

    /// Every problem with the draft, not just the first one.
    pub fn validate(&self) -> Result<(), WorkflowError> {
        let mut errors = Vec::new();

        require_text(&mut errors, "origin_city", &self.origin_city);
        require_text(&mut errors, "destination_city", &self.destination_city);
        require_text(&mut errors, "cargo_type", &self.cargo_type);
        if self.weight_kg == 0 {
            errors.push(FieldError::new("weight_kg", "must be greater than zero"));
        }
        optional_text(&mut errors, "origin_address", self.origin_address.as_deref());
        optional_text(
            &mut errors,
            "destination_address",
            self.destination_address.as_deref(),
        );
        optional_text(&mut errors, "dimensions", self.dimensions.as_deref());

        if errors.is_empty() {
            Ok(())
        } else {
            Err(WorkflowError::Validation(errors))
        }
    }
}

/// Partial update. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestPatch {
    pub origin_city: Option<String>,
    pub origin_address: Option<String>,
    pub destination_city: Option<String>,
    pub destination_address: Option<String>,
    pub cargo_type: Option<String>,
    pub weight_kg: Option<u64>,
    pub dimensions: Option<String>,
    pub description: Option<String>,
    pub estimated_cost: Option<u64>,
    pub transport_type: Option<TransportType>,
    pub carrier: Option<String>,
    pub urgency: Option<Urgency>,
}

impl RequestPatch {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn set_origin_city(mut self, city: &str) -> Self {
        self.origin_city = Some(city.to_owned());
        self
    }
    pub fn set_origin_address(mut self, address: &str) -> Self {
        self.origin_address = Some(address.to_owned());
        self
    }
    pub fn set_destination_city(mut self, city: &str) -> Self {
        self.destination_city = Some(city.to_owned());
        self
    }
    pub fn set_destination_address(mut self, address: &str) -> Self {
        self.destination_address = Some(address.to_owned());
        self
    }
    pub fn set_cargo_type(mut self, cargo_type: &str) -> Self {
        self.cargo_type = Some(cargo_type.to_owned());
        self
    }
    pub fn set_weight_kg(mut self, weight: u64) -> Self {
        self.weight_kg = Some(weight);
        self
    }
    pub fn set_dimensions(mut self, dimensions: &str) -> Self {
        self.dimensions = Some(dimensions.to_owned());
        self
    }
    pub fn set_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_owned());
        self
    }
    pub fn set_estimated_cost(mut self, cost: u64) -> Self {
        self.estimated_cost = Some(cost);
        self
    }
    pub fn set_transport_type(mut self, transport_type: TransportType) -> Self {
        self.transport_type = Some(transport_type);
        self
    }
    pub fn set_carrier(mut self, carrier: &str) -> Self {
        self.carrier = Some(carrier.to_owned());
        self
    }
    pub fn set_urgency(mut self, urgency: Urgency) -> Self {
        self.urgency = Some(urgency);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn validate(&self) -> Result<(), WorkflowError> {
        let mut errors = Vec::new();

        if self.is_empty() {
            errors.push(FieldError::new("patch", "carries no fields"));
        }
        for (field, value) in [
            ("origin_city", &self.origin_city),
            ("destination_city", &self.destination_city),
            ("cargo_type", &self.cargo_type),
            ("origin_address", &self.origin_address),
            ("destination_address", &self.destination_address),
            ("dimensions", &self.dimensions),
            ("carrier", &self.carrier),
        ] {
            optional_text(&mut errors, field, value.as_deref());
        }
        if self.weight_kg == Some(0) {
            errors.push(FieldError::new("weight_kg", "must be greater than zero"));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(WorkflowError::Validation(errors))
        }
    }
}

impl Request {
    /// A freshly numbered request in the initial status.
    pub fn new(
        id: RequestId,
        number: RequestNumber,
        fields: RequestFields,
        created_by: UserId,
        now: TimeStamp,
    ) -> Self {
        Self {
            id,
            number,
            fields,
            logistics: LogisticsDetails::default(),
            status: Status::Created,
            created_by,
            created_at: now,
            updated_at: now,
            revision: 0,
        }
    }

    /// Copy of this request one revision later, with identity and ownership untouched.
    pub fn next_revision(&self, status: Status, now: TimeStamp) -> Self {
        Self {
            status,
            updated_at: now,
            revision: self.revision + 1,
            ..self.clone()
        }
    }

    /// Apply a patch in place, returning the names of fields whose value changed.
    pub fn apply(&mut self, patch: &RequestPatch) -> Vec<&'static str> {
        let mut changed = Vec::new();
        let fields = &mut self.fields;
        let logistics = &mut self.logistics;

        assign(&mut changed, "origin_city", &mut fields.origin_city, &patch.origin_city);
        assign_opt(&mut changed, "origin_address", &mut fields.origin_address, &patch.origin_address);
        assign(&mut changed, "destination_city", &mut fields.destination_city, &patch.destination_city);
        assign_opt(
            &mut changed,
            "destination_address",
            &mut fields.destination_address,
            &patch.destination_address,
        );
        assign(&mut changed, "cargo_type", &mut fields.cargo_type, &patch.cargo_type);
        assign(&mut changed, "weight_kg", &mut fields.weight_kg, &patch.weight_kg);
        assign_opt(&mut changed, "dimensions", &mut fields.dimensions, &patch.dimensions);
        assign_opt(&mut changed, "description", &mut fields.description, &patch.description);
        assign_opt(&mut changed, "estimated_cost", &mut logistics.estimated_cost, &patch.estimated_cost);
        assign_opt(&mut changed, "transport_type", &mut logistics.transport_type, &patch.transport_type);
        assign_opt(&mut changed, "carrier", &mut logistics.carrier, &patch.carrier);
        assign_opt(&mut changed, "urgency", &mut logistics.urgency, &patch.urgency);

        changed
    }
}

fn assign<T: PartialEq + Clone>(
    changed: &mut Vec<&'static str>,
    name: &'static str,
    slot: &mut T,
    value: &Option<T>,
) {
    if let Some(value) = value {
        if slot != value {
            *slot = value.clone();
            changed.push(name);
        }
    }
}

fn assign_opt<T: PartialEq + Clone>(
    changed: &mut Vec<&'static str>,
    name: &'static str,
    slot: &mut Option<T>,
    value: &Option<T>,
) {
    if let Some(value) = value {
        if slot.as_ref() != Some(value) {
            *slot = Some(value.clone());
            changed.push(name);
        }
    }
}

fn require_text(errors: &mut Vec<FieldError>, field: &'static str, value: &str) {
    if value.trim().is_empty() {
        errors.push(FieldError::new(field, "is required"));
    }
}

fn optional_text(errors: &mut Vec<FieldError>, field: &'static str, value: Option<&str>) {
    if value.is_some_and(|v| v.trim().is_empty()) {
        errors.push(FieldError::new(field, "must not be blank when given"));
    }
}
