//! Jurisdiction checks shared across the resource services.

use uuid::Uuid;

use crate::database::models::{Location, Role, User};

/// Generic ownership/jurisdiction check for a protected resource.
///
/// Super admins always pass; district admins pass when the resource district
/// matches their assignment; sector admins when the sector matches; citizens
/// only when they own the resource.
pub fn can_access(actor: &User, resource_location: &Location, owner: Uuid) -> bool {
    match actor.role {
        Role::SuperAdmin => true,
        Role::DistrictAdmin => actor.location.district == resource_location.district,
        Role::SectorAdmin => actor.location.sector == resource_location.sector,
        Role::Citizen => actor.id == owner,
    }
}

/// Admin jurisdiction over a location: sector admins are bound to their
/// sector+district, district admins to their district, super admins are
/// unbounded. Citizens have no admin jurisdiction.
pub fn admin_scope_matches(actor: &User, location: &Location) -> bool {
    match actor.role {
        Role::SectorAdmin => {
            actor.location.sector == location.sector
                && actor.location.district == location.district
        }
        Role::DistrictAdmin => actor.location.district == location.district,
        Role::SuperAdmin => true,
        Role::Citizen => false,
    }
}

/// Group membership location rule: district admins match on
/// province+district only; everyone else needs the full triple to match.
pub fn can_join_group(actor: &User, group_location: &Location) -> bool {
    match actor.role {
        Role::DistrictAdmin => actor.location.matches_district(group_location),
        _ => actor.location.matches_exactly(group_location),
    }
}

/// Role/location mutation requires the actor to outrank both the target's
/// current role and the requested role.
pub fn can_change_role(actor: &User, target_current: Role, requested: Role) -> bool {
    actor.role.rank() > target_current.rank() && actor.role.rank() > requested.rank()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(role: Role, province: &str, district: &str, sector: &str) -> User {
        User {
            id: Uuid::new_v4(),
            name: "Test".into(),
            email: format!("{}@example.com", Uuid::new_v4()),
            password_hash: String::new(),
            role,
            location: Location::new(province, district, sector),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn citizen_only_accesses_own_resources() {
        let citizen = user(Role::Citizen, "Kigali", "Gasabo", "Remera");
        let here = Location::new("Kigali", "Gasabo", "Remera");
        assert!(can_access(&citizen, &here, citizen.id));
        assert!(!can_access(&citizen, &here, Uuid::new_v4()));
    }

    #[test]
    fn sector_admin_bound_to_sector() {
        let admin = user(Role::SectorAdmin, "Kigali", "Gasabo", "Remera");
        let inside = Location::new("Kigali", "Gasabo", "Remera");
        let outside = Location::new("Kigali", "Gasabo", "Kimironko");
        assert!(can_access(&admin, &inside, Uuid::new_v4()));
        assert!(!can_access(&admin, &outside, Uuid::new_v4()));
    }

    #[test]
    fn district_admin_bound_to_district() {
        let admin = user(Role::DistrictAdmin, "Kigali", "Gasabo", "Remera");
        let other_sector = Location::new("Kigali", "Gasabo", "Kimironko");
        let other_district = Location::new("Kigali", "Nyarugenge", "Nyamirambo");
        assert!(can_access(&admin, &other_sector, Uuid::new_v4()));
        assert!(!can_access(&admin, &other_district, Uuid::new_v4()));
    }

    #[test]
    fn super_admin_always_passes() {
        let admin = user(Role::SuperAdmin, "Kigali", "", "");
        let anywhere = Location::new("Eastern", "Rwamagana", "Kigabiro");
        assert!(can_access(&admin, &anywhere, Uuid::new_v4()));
        assert!(admin_scope_matches(&admin, &anywhere));
    }

    #[test]
    fn citizen_has_no_admin_scope() {
        let citizen = user(Role::Citizen, "Kigali", "Gasabo", "Remera");
        let own = Location::new("Kigali", "Gasabo", "Remera");
        assert!(!admin_scope_matches(&citizen, &own));
    }

    #[test]
    fn group_join_relaxed_for_district_admins_only() {
        let group_location = Location::new("Kigali", "Gasabo", "Remera");

        let citizen_elsewhere = user(Role::Citizen, "Kigali", "Gasabo", "Kimironko");
        assert!(!can_join_group(&citizen_elsewhere, &group_location));

        let district_admin = user(Role::DistrictAdmin, "Kigali", "Gasabo", "Kacyiru");
        assert!(can_join_group(&district_admin, &group_location));

        let wrong_district_admin = user(Role::DistrictAdmin, "Kigali", "Nyarugenge", "Kacyiru");
        assert!(!can_join_group(&wrong_district_admin, &group_location));
    }

    #[test]
    fn role_change_needs_strictly_higher_rank() {
        let super_admin = user(Role::SuperAdmin, "Kigali", "", "");
        let district_admin = user(Role::DistrictAdmin, "Kigali", "Gasabo", "");

        assert!(can_change_role(&super_admin, Role::Citizen, Role::DistrictAdmin));
        assert!(can_change_role(&district_admin, Role::Citizen, Role::SectorAdmin));
        // Peers cannot promote to their own rank or mutate peers
        assert!(!can_change_role(&district_admin, Role::Citizen, Role::DistrictAdmin));
        assert!(!can_change_role(&district_admin, Role::DistrictAdmin, Role::Citizen));
        assert!(!can_change_role(&super_admin, Role::Citizen, Role::SuperAdmin));
    }
}
