//! Named services over JSON bodies.
//!
//! Every conversion and enrichment is exposed under a stable name
//! (`oai-to-dpla`, `copy_rights`, ...). A call takes a JSON body, a flat
//! option map and an optional contributor header, and returns the
//! re-serialized result. The CLI and the HTTP host are thin shells over
//! [`Dispatcher`].

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::config::ServiceDefaults;
use crate::convert::{convert_record, ConvertOptions, Schema};
use crate::enrich::{
    options_from_params, CopyRights, EnrichFormat, EnrichSubject, EnrichType, Enrichment,
    IdentifyObject, MoveDatesToTemporal, Shred,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// The body is not a JSON object.
    InvalidBody(String),
    UnknownService(String),
    InvalidOption { service: Service, message: String },
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::InvalidBody(_) => write!(f, "Unable to parse body as JSON"),
            ServiceError::UnknownService(name) => write!(f, "Unknown service: {}", name),
            ServiceError::InvalidOption { service, message } => {
                write!(f, "Invalid option for {}: {}", service, message)
            }
        }
    }
}

impl std::error::Error for ServiceError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    OaiToDpla,
    ArcToDpla,
    CopyRights,
    EnrichFormat,
    EnrichType,
    EnrichSubject,
    Shred,
    MoveDatesToTemporal,
    IdentifyObject,
}

impl Service {
    pub const ALL: [Service; 9] = [
        Service::OaiToDpla,
        Service::ArcToDpla,
        Service::CopyRights,
        Service::EnrichFormat,
        Service::EnrichType,
        Service::EnrichSubject,
        Service::Shred,
        Service::MoveDatesToTemporal,
        Service::IdentifyObject,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Service::OaiToDpla => "oai-to-dpla",
            Service::ArcToDpla => "arc-to-dpla",
            Service::CopyRights => "copy_rights",
            Service::EnrichFormat => "enrich-format",
            Service::EnrichType => "enrich-type",
            Service::EnrichSubject => "enrich-subject",
            Service::Shred => "shred",
            Service::MoveDatesToTemporal => "move_dates_to_temporal",
            Service::IdentifyObject => "identify_object",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Service::OaiToDpla => "Convert an OAI Dublin Core record to the canonical envelope",
            Service::ArcToDpla => "Convert a NARA ARC description to the canonical envelope",
            Service::CopyRights => "Copy the rights statement onto existing web resources",
            Service::EnrichFormat => "Normalize media types, moving other formats aside",
            Service::EnrichType => "Normalize DCMI type values",
            Service::EnrichSubject => "Clean subject headings into name mappings",
            Service::Shred => "Split (or with action=unshred, join) delimited fields",
            Service::MoveDatesToTemporal => "Move date-shaped entries of a list into temporal",
            Service::IdentifyObject => "Derive the preview thumbnail location",
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Service {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().trim_matches('/');
        Service::ALL
            .into_iter()
            .find(|service| service.name() == name)
            .or(match name {
                "kentucky_identify_object" | "kentucky-identify-object" => {
                    Some(Service::IdentifyObject)
                }
                _ => None,
            })
            .ok_or_else(|| ServiceError::UnknownService(name.to_string()))
    }
}

/// One service call.
#[derive(Debug, Clone, Default)]
pub struct ServiceRequest {
    pub body: String,
    /// Per-call options; these override configured defaults.
    pub params: HashMap<String, String>,
    /// Base64-encoded JSON contributor block, honoured by conversions.
    pub contributor: Option<String>,
}

impl ServiceRequest {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            ..Self::default()
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn with_contributor(mut self, contributor: impl Into<String>) -> Self {
        self.contributor = Some(contributor.into());
        self
    }
}

/// Options read by the conversion services.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConvertParams {
    geoprop: Option<String>,
}

/// Runs services with a fixed set of option defaults.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    defaults: HashMap<String, String>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(&ServiceDefaults::default())
    }
}

impl Dispatcher {
    pub fn new(defaults: &ServiceDefaults) -> Self {
        Self {
            defaults: defaults.as_params(),
        }
    }

    /// Run `service` over the request body and serialize the result.
    ///
    /// # Errors
    /// `InvalidBody` when the body is not a JSON object, `InvalidOption`
    /// when an option fails to parse. Field-level problems never error.
    pub fn run(&self, service: Service, request: &ServiceRequest) -> Result<String, ServiceError> {
        let doc = parse_body(&request.body)?;
        let out = self.process(service, doc, &request.params, request.contributor.as_deref())?;
        Ok(out.to_string())
    }

    /// Run `service` over an already-parsed document.
    pub fn process(
        &self,
        service: Service,
        doc: Value,
        params: &HashMap<String, String>,
        contributor: Option<&str>,
    ) -> Result<Value, ServiceError> {
        if !doc.is_object() {
            return Err(ServiceError::InvalidBody("expected a JSON object".to_string()));
        }

        let mut merged = self.defaults.clone();
        merged.extend(params.iter().map(|(k, v)| (k.clone(), v.clone())));

        match service {
            Service::OaiToDpla => convert_with(Schema::Oai, service, &merged, &doc, contributor),
            Service::ArcToDpla => convert_with(Schema::Arc, service, &merged, &doc, contributor),
            Service::CopyRights => enrich_with::<CopyRights>(service, &merged, doc),
            Service::EnrichFormat => enrich_with::<EnrichFormat>(service, &merged, doc),
            Service::EnrichType => enrich_with::<EnrichType>(service, &merged, doc),
            Service::EnrichSubject => enrich_with::<EnrichSubject>(service, &merged, doc),
            Service::Shred => enrich_with::<Shred>(service, &merged, doc),
            Service::MoveDatesToTemporal => {
                enrich_with::<MoveDatesToTemporal>(service, &merged, doc)
            }
            Service::IdentifyObject => enrich_with::<IdentifyObject>(service, &merged, doc),
        }
    }
}

/// Run `service` with built-in defaults.
pub fn run(service: Service, request: &ServiceRequest) -> Result<String, ServiceError> {
    Dispatcher::default().run(service, request)
}

pub fn parse_body(body: &str) -> Result<Value, ServiceError> {
    let doc: Value = serde_json::from_str(body).map_err(|e| {
        tracing::debug!("Rejecting body: {}", e);
        ServiceError::InvalidBody(e.to_string())
    })?;
    if !doc.is_object() {
        return Err(ServiceError::InvalidBody("expected a JSON object".to_string()));
    }
    Ok(doc)
}

fn parse_options<T: DeserializeOwned>(
    service: Service,
    params: &HashMap<String, String>,
) -> Result<T, ServiceError> {
    options_from_params(params).map_err(|e| ServiceError::InvalidOption {
        service,
        message: e.to_string(),
    })
}

fn convert_with(
    schema: Schema,
    service: Service,
    params: &HashMap<String, String>,
    record: &Value,
    contributor: Option<&str>,
) -> Result<Value, ServiceError> {
    let opts: ConvertParams = parse_options(service, params)?;
    let options = ConvertOptions {
        geoprop: opts.geoprop.filter(|g| !g.is_empty()),
        contributor: contributor.map(str::to_string),
    };
    Ok(convert_record(schema, record, &options))
}

fn enrich_with<T>(
    service: Service,
    params: &HashMap<String, String>,
    mut doc: Value,
) -> Result<Value, ServiceError>
where
    T: Enrichment + DeserializeOwned,
{
    let filter: T = parse_options(service, params)?;
    filter.enrich(&mut doc);
    Ok(doc)
}
