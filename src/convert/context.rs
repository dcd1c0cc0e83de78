//! JSON-LD vocabulary context attached to every envelope.

use once_cell::sync::Lazy;
use serde_json::{json, Value};

pub static CONTEXT: Lazy<Value> = Lazy::new(|| {
    json!({
        "@vocab": "http://purl.org/dc/terms/",
        "dpla": "http://dp.la/terms/",
        "edm": "http://www.europeana.eu/schemas/edm/",
        "LCSH": "http://id.loc.gov/authorities/subjects",
        "name": "xsd:string",
        "collection": "dpla:aggregation",
        "aggregatedDigitalResource": "dpla:aggregatedDigitalResource",
        "originalRecord": "dpla:originalRecord",
        "state": "dpla:state",
        "coordinates": "dpla:coordinates",
        "stateLocatedIn": "dpla:stateLocatedIn",
        "iso3166-2": "dpla:iso3166-2",
        "iso639": "dpla:iso639",
        "aggregatedCHO": "edm:aggregatedCHO",
        "dataProvider": "edm:dataProvider",
        "hasView": "edm:hasView",
        "isShownAt": "edm:isShownAt",
        "object": "edm:object",
        "provider": "edm:provider",
        "start": {
            "@id": "dpla:start",
            "@type": "xsd:date"
        },
        "end": {
            "@id": "dpla:end",
            "@type": "xsd:date"
        }
    })
});
