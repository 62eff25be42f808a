//! Organization bootstrap.

use fleet_core::error::{FleetError, FleetResult};
use fleet_core::models::membership::UserOrganization;
use fleet_core::models::organization::{CreateOrganization, Organization};
use fleet_core::repository::OrganizationRepository;
use tracing::info;
use uuid::Uuid;

pub struct OrganizationService<O: OrganizationRepository> {
    organizations: O,
}

impl<O: OrganizationRepository> OrganizationService<O> {
    pub fn new(organizations: O) -> Self {
        Self { organizations }
    }

    /// Create an organization. When `owner` is given the caller becomes its
    /// owner in the same transaction, with this organization as default.
    pub async fn create(
        &self,
        input: CreateOrganization,
        owner: Option<Uuid>,
    ) -> FleetResult<(Organization, Option<UserOrganization>)> {
        if input.name.trim().is_empty() {
            return Err(FleetError::required("name"));
        }

        let Some(owner) = owner else {
            let organization = self.organizations.create(input).await?;
            info!(organization_id = %organization.id, "organization created without owner");
            return Ok((organization, None));
        };

        let created = self.organizations.create_with_owner(input, owner).await?;
        info!(
            organization_id = %created.organization.id,
            owner = %owner,
            "organization created"
        );
        Ok((created.organization, Some(created.owner)))
    }
}
