//! Descriptor-driven façade shared by every `fleet.*` entity service.
//!
//! Each service is an [`EntityFacade`] parameterised by a marker type
//! naming its [`EntityDescriptor`]. Requests are validated and scoped to
//! the caller's tenant before the store is touched.

use std::marker::PhantomData;
use std::sync::Arc;

use fleet_core::entity::{
    EntityDescriptor, Fields, Operation, UpdateMode, catalog, ensure_same_tenant,
};
use fleet_core::error::{FleetError, FleetResult};
use fleet_core::pagination::PageRequest;
use fleet_core::repository::EntityStore;
use fleet_core::{CallContext, TenantId};
use prost_types::Struct;
use serde_json::Value;
use tonic::body::Body;
use tonic::service::RoutesBuilder;
use tracing::debug;

use crate::grpc::{Dispatch, GrpcServer, RouteFuture, route};
use crate::wire::SuccessResponse;
use crate::wire::convert::{fields_to_struct, struct_to_fields};
use crate::wire::fleet::{
    BulkCreateRequest, BulkCreateResponse, ListRecordsRequest, ListRecordsResponse, LookupRequest,
    RecordRequest, RecordResponse,
};

/// Binds a routed service type to its descriptor.
pub trait EntityService: Send + Sync + 'static {
    const DESCRIPTOR: &'static EntityDescriptor;
}

pub struct EntityFacade<S, M> {
    store: Arc<S>,
    _service: PhantomData<fn() -> M>,
}

impl<S: EntityStore, M: EntityService> EntityFacade<S, M> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            _service: PhantomData,
        }
    }

    fn enabled(op: Operation) -> FleetResult<()> {
        match M::DESCRIPTOR.disabled_reason(op) {
            Some(reason) => Err(FleetError::Unimplemented {
                reason: reason.into(),
            }),
            None => Ok(()),
        }
    }

    pub async fn create(&self, ctx: &CallContext, req: RecordRequest) -> FleetResult<RecordResponse> {
        Self::enabled(Operation::Create)?;
        let entity = M::DESCRIPTOR;
        let tenant = ctx.require_tenant()?;
        let fields = prepare_create(entity, tenant, req.record)?;

        let record = self.store.create(entity, tenant, fields).await?;
        debug!(entity = entity.table, tenant = %tenant, "record created");
        Ok(record.into())
    }

    pub async fn get(&self, ctx: &CallContext, req: RecordRequest) -> FleetResult<RecordResponse> {
        Self::enabled(Operation::Get)?;
        let entity = M::DESCRIPTOR;
        let tenant = ctx.require_tenant()?;
        let mut fields = record_fields(req.record);
        entity.scope_to_tenant(tenant, &mut fields)?;
        let key = entity.key_of(&fields)?;

        Ok(self.store.get(entity, tenant, &key).await?.into())
    }

    pub async fn update(&self, ctx: &CallContext, req: RecordRequest) -> FleetResult<RecordResponse> {
        Self::enabled(Operation::Update)?;
        let entity = M::DESCRIPTOR;
        let tenant = ctx.require_tenant()?;
        let mut fields = record_fields(req.record);
        entity.validate_update(&fields)?;
        entity.scope_to_tenant(tenant, &mut fields)?;
        let key = entity.key_of(&fields)?;

        let fields = match entity.update {
            UpdateMode::Replace => fields,
            UpdateMode::Merge { .. } => {
                let stored = self.store.get(entity, tenant, &key).await?;
                entity.merge_for_update(&stored.fields, fields)
            }
        };
        let record = self.store.update(entity, tenant, &key, fields).await?;
        debug!(entity = entity.table, tenant = %tenant, key = %key, "record updated");
        Ok(record.into())
    }

    /// Soft-delete entities keep the row and stamp their deletion field.
    pub async fn delete(&self, ctx: &CallContext, req: RecordRequest) -> FleetResult<SuccessResponse> {
        Self::enabled(Operation::Delete)?;
        let entity = M::DESCRIPTOR;
        let tenant = ctx.require_tenant()?;
        let mut fields = record_fields(req.record);
        entity.scope_to_tenant(tenant, &mut fields)?;
        let key = entity.key_of(&fields)?;

        self.store.delete(entity, tenant, &key).await?;
        debug!(entity = entity.table, tenant = %tenant, key = %key, "record deleted");
        Ok(SuccessResponse { success: true })
    }

    pub async fn list(&self, ctx: &CallContext, req: ListRecordsRequest) -> FleetResult<ListRecordsResponse> {
        Self::enabled(Operation::List)?;
        self.page(ctx.require_tenant()?, &req).await
    }

    pub async fn list_by_organization(
        &self,
        ctx: &CallContext,
        req: ListRecordsRequest,
    ) -> FleetResult<ListRecordsResponse> {
        Self::enabled(Operation::ListByOrganization)?;
        let tenant = ctx.require_tenant()?;
        ensure_same_tenant(tenant, Some(&Value::String(req.organization_id.clone())))?;
        self.page(tenant, &req).await
    }

    async fn page(&self, tenant: &TenantId, req: &ListRecordsRequest) -> FleetResult<ListRecordsResponse> {
        let entity = M::DESCRIPTOR;
        let page = PageRequest::from_wire(req.page_size, &req.page_token)?;
        let rows = self.store.list(entity, tenant, page.probe()).await?;
        let page = page.finish(rows);
        Ok(ListRecordsResponse {
            records: page
                .items
                .into_iter()
                .map(|record| fields_to_struct(record.fields))
                .collect(),
            next_page_token: page.next_page_token,
        })
    }

    pub async fn lookup(&self, ctx: &CallContext, req: LookupRequest) -> FleetResult<RecordResponse> {
        Self::enabled(Operation::Lookup)?;
        let entity = M::DESCRIPTOR;
        let tenant = ctx.require_tenant()?;
        let field = entity.unique.ok_or_else(|| FleetError::Unimplemented {
            reason: format!("{} has no lookup", entity.singular),
        })?;
        if req.value.is_empty() {
            return Err(FleetError::required(field));
        }

        let record = self
            .store
            .find_unique(entity, tenant, &Value::String(req.value))
            .await?;
        Ok(record.into())
    }

    /// Records whose unique field is already taken are skipped, not failed.
    pub async fn bulk_create(
        &self,
        ctx: &CallContext,
        req: BulkCreateRequest,
    ) -> FleetResult<BulkCreateResponse> {
        Self::enabled(Operation::BulkCreate)?;
        let entity = M::DESCRIPTOR;
        let tenant = ctx.require_tenant()?;
        let rows = req
            .records
            .into_iter()
            .map(|record| prepare_create(entity, tenant, Some(record)))
            .collect::<FleetResult<Vec<_>>>()?;

        let outcome = self.store.bulk_create(entity, tenant, rows).await?;
        Ok(BulkCreateResponse {
            created: outcome.created.len() as i32,
            skipped: outcome.skipped as i32,
            records: outcome
                .created
                .into_iter()
                .map(|record| fields_to_struct(record.fields))
                .collect(),
        })
    }
}

fn record_fields(record: Option<Struct>) -> Fields {
    record.map(struct_to_fields).unwrap_or_default()
}

fn prepare_create(
    entity: &'static EntityDescriptor,
    tenant: &TenantId,
    record: Option<Struct>,
) -> FleetResult<Fields> {
    let mut fields = record_fields(record);
    entity.validate_create(&fields)?;
    entity.scope_to_tenant(tenant, &mut fields)?;
    entity.assign_key(&mut fields);
    Ok(fields)
}

impl<S, M> Dispatch for EntityFacade<S, M>
where
    S: EntityStore + 'static,
    M: EntityService,
{
    const NAME: &'static str = M::DESCRIPTOR.service;

    fn dispatch(self: Arc<Self>, method: &str, req: http::Request<Body>) -> Option<RouteFuture> {
        let future = match M::DESCRIPTOR.resolve(method)? {
            Operation::Create => route!(self, req, create),
            Operation::Get => route!(self, req, get),
            Operation::Update => route!(self, req, update),
            Operation::Delete => route!(self, req, delete),
            Operation::List => route!(self, req, list),
            Operation::ListByOrganization => route!(self, req, list_by_organization),
            Operation::Lookup => route!(self, req, lookup),
            Operation::BulkCreate => route!(self, req, bulk_create),
        };
        Some(future)
    }
}

macro_rules! entity_services {
    ($($service:ident => $descriptor:ident,)*) => {
        $(
            pub struct $service;

            impl EntityService for $service {
                const DESCRIPTOR: &'static EntityDescriptor = &catalog::$descriptor;
            }
        )*

        /// Route every fleet entity service to `store`.
        pub fn add_entity_services<S: EntityStore + 'static>(routes: &mut RoutesBuilder, store: Arc<S>) {
            $(
                routes.add_service(GrpcServer::new(EntityFacade::<S, $service>::new(Arc::clone(&store))));
            )*
        }
    };
}

entity_services! {
    CamFileService => CAM_FILE,
    CamFileExeService => CAM_FILE_EXE,
    CamFileExeStageService => CAM_FILE_EXE_STAGE,
    CarInsSheetIchibanCarsService => CAR_INS_SHEET_ICHIBAN_CARS,
    CarInsSheetIchibanCarsAService => CAR_INS_SHEET_ICHIBAN_CARS_A,
    CarInspectionService => CAR_INSPECTION,
    CarInspectionDeregistrationService => CAR_INSPECTION_DEREGISTRATION,
    CarInspectionDeregistrationFilesService => CAR_INSPECTION_DEREGISTRATION_FILES,
    CarInspectionFilesService => CAR_INSPECTION_FILES,
    CarInspectionFilesAService => CAR_INSPECTION_FILES_A,
    CarInspectionFilesBService => CAR_INSPECTION_FILES_B,
    DtakoCarsIchibanCarsService => DTAKO_CARS_ICHIBAN_CARS,
    DtakologsService => DTAKOLOGS,
    EtcMeisaiService => ETC_MEISAI,
    FileService => FILES,
    FlickrPhotoService => FLICKR_PHOTO,
    IchibanCarService => ICHIBAN_CARS,
    KudgcstService => KUDGCST,
    KudgfryService => KUDGFRY,
    KudgfulService => KUDGFUL,
    KudgivtService => KUDGIVT,
    KudgsirService => KUDGSIR,
    KudguriService => KUDGURI,
    UriageService => URIAGE,
    UriageJishaService => URIAGE_JISHA,
}
