//! Built-in Resources
//!
//! Schemas for the dashboard's resource screens. Each one is instantiated
//! with the same store/form/filter machinery.

use crate::domain::{FieldSpec, FilterSpec, ResourceSchema, TabSpec};

pub const PROJECT_STATUSES: &[&str] = &["Planning", "In Progress", "Completed"];
pub const AVAILABILITY: &[&str] = &["Available", "On Set", "In Post"];
pub const BID_STATUSES: &[&str] = &["Pending", "Accepted", "Rejected"];
pub const EQUIPMENT_CATEGORIES: &[&str] = &["camera", "audio", "lighting", "grip", "storage"];
pub const EQUIPMENT_STATUSES: &[&str] = &["Available", "In Use", "In Maintenance"];
pub const EQUIPMENT_CONDITIONS: &[&str] = &["Excellent", "Good", "Fair", "Poor"];
pub const LOCATION_CATEGORIES: &[&str] = &["Indoor", "Outdoor"];
pub const TALENT_ROLES: &[&str] = &[
    "Actor",
    "Director",
    "Cinematographer",
    "Editor",
    "Production Designer",
    "Sound Designer",
];

pub fn projects() -> ResourceSchema {
    ResourceSchema::new("projects", "/projects", "/dashboard/Projects")
        .labels("project", "projects")
        .field(FieldSpec::text("title", "Title").required())
        .field(FieldSpec::choice("status", "Status", PROJECT_STATUSES).required())
        .field(FieldSpec::date("dueDate", "Due Date").required())
        .field(FieldSpec::number("budget", "Budget ($)").required())
        .field(FieldSpec::number("team", "Team Size").required())
        .search(&["title"])
        .filter(FilterSpec::new("status", "All", PROJECT_STATUSES))
}

pub fn team() -> ResourceSchema {
    ResourceSchema::new("team", "/team", "/dashboard/team")
        .labels("team member", "team members")
        .field(FieldSpec::text("name", "Name").required())
        .field(FieldSpec::text("role", "Role").required())
        .field(FieldSpec::text("project", "Project").required())
        .field(FieldSpec::email("email", "Email").required())
        .field(FieldSpec::text("phone", "Phone").required())
        .field(FieldSpec::choice("availability", "Availability", AVAILABILITY).default_value("Available"))
        .field(FieldSpec::list("tasks", "Tasks"))
        .search(&["name", "role", "project"])
        .filter(FilterSpec::new("availability", "All", AVAILABILITY))
}

pub fn bids() -> ResourceSchema {
    ResourceSchema::new("bids", "/bids", "/dashboard/bids")
        .labels("bid", "bids")
        .field(FieldSpec::text("project", "Project").required())
        .field(FieldSpec::text("role", "Role").required())
        .field(FieldSpec::text("bidder", "Bidder").required())
        .field(FieldSpec::text("amount", "Amount").required())
        .field(FieldSpec::number("rating", "Rating"))
        .field(FieldSpec::choice("status", "Status", BID_STATUSES).default_value("Pending"))
        .search(&["project", "bidder"])
        .filter(FilterSpec::new("status", "All", BID_STATUSES))
        .tab(TabSpec::all("all"))
        .tab(TabSpec::only("pending", "status", "Pending"))
}

pub fn equipment() -> ResourceSchema {
    ResourceSchema::new("equipment", "/equipment", "/dashboard/equipment")
        .labels("equipment item", "equipment")
        .field(FieldSpec::text("name", "Name").required())
        .field(FieldSpec::choice("category", "Category", EQUIPMENT_CATEGORIES).required())
        .field(FieldSpec::choice("status", "Status", EQUIPMENT_STATUSES).default_value("Available"))
        .field(FieldSpec::choice("condition", "Condition", EQUIPMENT_CONDITIONS).default_value("Good"))
        .field(FieldSpec::date("lastMaintenance", "Last Maintenance"))
        .search(&["name", "category"])
        .filter(FilterSpec::new("category", "all", EQUIPMENT_CATEGORIES))
}

pub fn locations() -> ResourceSchema {
    ResourceSchema::new("locations", "/locations", "/dashboard/location-scouting")
        .labels("location", "locations")
        .field(FieldSpec::text("name", "Name").required())
        .field(FieldSpec::choice("category", "Category", LOCATION_CATEGORIES).required())
        .field(FieldSpec::text("address", "Address").required())
        .field(FieldSpec::number("cost", "Cost per Day ($)"))
        .field(FieldSpec::date("availability", "Available From"))
        .field(FieldSpec::text("pros", "Pros"))
        .field(FieldSpec::text("cons", "Cons"))
        .field(FieldSpec::text("imageUrl", "Image URL"))
        .search(&["name"])
        .filter(FilterSpec::new("category", "All", LOCATION_CATEGORIES))
}

pub fn talent() -> ResourceSchema {
    ResourceSchema::new("talent", "/talent", "/dashboard/talent-pool")
        .labels("talent profile", "talent")
        .field(FieldSpec::text("name", "Name").required())
        .field(FieldSpec::choice("role", "Role", TALENT_ROLES).required())
        .field(FieldSpec::list("skills", "Skills"))
        .field(FieldSpec::text("experience", "Experience"))
        .field(FieldSpec::email("contact", "Contact Email"))
        .field(FieldSpec::text("location", "Location"))
        .field(FieldSpec::text("achievements", "Achievements"))
        .field(FieldSpec::text("imageUrl", "Image URL"))
        .search(&["name"])
        .filter(FilterSpec::new("role", "All", TALENT_ROLES))
}

pub const BID_GENRES: &[&str] = &["action", "comedy", "drama", "sci-fi", "horror"];

/// Roles a producer can ask for on a bid request
pub const BID_ROLES: &[&str] = &[
    "Director",
    "Cinematographer",
    "Sound Designer",
    "Editor",
    "VFX Artist",
    "Production Designer",
];

/// Create-bid form. Submit-only, so it is not part of `all()`.
pub fn producer_bid() -> ResourceSchema {
    ResourceSchema::new("producerbids", "/api/producerbids", "/dashboard/create-bid")
        .labels("bid", "bids")
        .field(FieldSpec::text("projectTitle", "Project Title"))
        .field(FieldSpec::text("description", "Project Description"))
        .field(FieldSpec::choice("genre", "Genre", BID_GENRES))
        .field(FieldSpec::text("filmingLocation", "Filming Location"))
        .field(FieldSpec::number("estimatedDurationWeeks", "Estimated Duration (weeks)").required())
        .field(FieldSpec::date("bidDeadline", "Bid Deadline").required())
        .field(FieldSpec::text("additionalRequirements", "Additional Requirements"))
}

/// Every built-in resource, in sidebar order
pub fn all() -> Vec<ResourceSchema> {
    vec![projects(), bids(), team(), talent(), equipment(), locations()]
}

/// Schema of the screen mounted at `route`
pub fn by_route(route: &str) -> Option<ResourceSchema> {
    let route = route.trim_end_matches('/');
    all().into_iter().find(|s| s.route == route)
}

pub fn by_key(key: &str) -> Option<ResourceSchema> {
    all().into_iter().find(|s| s.key == key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_routes_and_endpoints_are_unique() {
        let schemas = all();
        let routes: HashSet<_> = schemas.iter().map(|s| s.route.clone()).collect();
        let endpoints: HashSet<_> = schemas.iter().map(|s| s.endpoint.clone()).collect();
        assert_eq!(routes.len(), schemas.len());
        assert_eq!(endpoints.len(), schemas.len());
    }

    #[test]
    fn test_lookup() {
        assert_eq!(by_route("/dashboard/team/").map(|s| s.key), Some("team".to_string()));
        assert_eq!(by_key("talent").map(|s| s.endpoint), Some("/talent".to_string()));
        assert!(by_route("/dashboard/settings").is_none());
    }

    #[test]
    fn test_search_and_filter_fields_exist() {
        for schema in all() {
            for field in &schema.search_fields {
                assert!(schema.field_spec(field).is_some(), "{}: {}", schema.key, field);
            }
            for filter in &schema.filters {
                assert!(schema.field_spec(&filter.field).is_some(), "{}: {}", schema.key, filter.field);
            }
            for (field, _) in schema.tabs.iter().filter_map(|t| t.predicate.as_ref()) {
                assert!(schema.field_spec(field).is_some(), "{}: {}", schema.key, field);
            }
        }
    }
}
