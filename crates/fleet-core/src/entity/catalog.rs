//! Descriptors for every tenant-scoped fleet entity.

use super::{EntityDescriptor, FieldSpec, Operation, UpdateMode, number, text};

const UUID_KEY: &[FieldSpec] = &[text("uuid")];

const PUBLISHDATE: [FieldSpec; 4] = [
    text("elect_cert_publishdate_e"),
    text("elect_cert_publishdate_y"),
    text("elect_cert_publishdate_m"),
    text("elect_cert_publishdate_d"),
];

const GRANTDATE: [FieldSpec; 4] = [
    text("grantdate_e"),
    text("grantdate_y"),
    text("grantdate_m"),
    text("grantdate_d"),
];

const KEEP_CREATED: UpdateMode = UpdateMode::Merge {
    immutable: &["created"],
};

// ---------------------------------------------------------------------------
// Camera files
// ---------------------------------------------------------------------------

pub const CAM_FILE: EntityDescriptor = EntityDescriptor {
    table: "cam_file",
    service: "fleet.CamFileService",
    singular: "CamFile",
    plural: "CamFiles",
    key: &[text("name")],
    required: &[text("date"), text("hour"), text("type"), text("cam")],
    disabled: &[(
        Operation::List,
        "use ListCamFilesByOrganization instead",
    )],
    ..EntityDescriptor::DEFAULT
};

pub const CAM_FILE_EXE: EntityDescriptor = EntityDescriptor {
    table: "cam_file_exe",
    service: "fleet.CamFileExeService",
    singular: "CamFileExe",
    plural: "CamFileExes",
    key: &[text("name"), text("cam")],
    required: &[number("stage")],
    disabled: &[(
        Operation::List,
        "use ListCamFileExesByOrganization instead",
    )],
    ..EntityDescriptor::DEFAULT
};

pub const CAM_FILE_EXE_STAGE: EntityDescriptor = EntityDescriptor {
    table: "cam_file_exe_stage",
    service: "fleet.CamFileExeStageService",
    singular: "CamFileExeStage",
    plural: "CamFileExeStages",
    key: &[number("stage")],
    required: &[text("name")],
    disabled: &[(
        Operation::List,
        "use ListCamFileExeStagesByOrganization instead",
    )],
    ..EntityDescriptor::DEFAULT
};

// ---------------------------------------------------------------------------
// Inspection sheets and certificates
// ---------------------------------------------------------------------------

pub const CAR_INS_SHEET_ICHIBAN_CARS: EntityDescriptor = EntityDescriptor {
    table: "car_ins_sheet_ichiban_cars",
    service: "fleet.CarInsSheetIchibanCarsService",
    singular: "CarInsSheetIchibanCars",
    plural: "CarInsSheetIchibanCarss",
    key: &[
        text("elect_cert_mg_no"),
        PUBLISHDATE[0],
        PUBLISHDATE[1],
        PUBLISHDATE[2],
        PUBLISHDATE[3],
    ],
    ..EntityDescriptor::DEFAULT
};

pub const CAR_INS_SHEET_ICHIBAN_CARS_A: EntityDescriptor = EntityDescriptor {
    table: "car_ins_sheet_ichiban_cars_a",
    service: "fleet.CarInsSheetIchibanCarsAService",
    singular: "CarInsSheetIchibanCarsA",
    plural: "CarInsSheetIchibanCarsAs",
    key: &[
        text("elect_cert_mg_no"),
        GRANTDATE[0],
        GRANTDATE[1],
        GRANTDATE[2],
        GRANTDATE[3],
    ],
    ..EntityDescriptor::DEFAULT
};

pub const CAR_INSPECTION: EntityDescriptor = EntityDescriptor {
    table: "car_inspection",
    service: "fleet.CarInspectionService",
    singular: "CarInspection",
    plural: "CarInspections",
    key: &[
        text("elect_cert_mg_no"),
        PUBLISHDATE[0],
        PUBLISHDATE[1],
        PUBLISHDATE[2],
        PUBLISHDATE[3],
    ],
    required: &[text("created"), text("modified")],
    required_on_update: Some(&[text("modified")]),
    update: KEEP_CREATED,
    ..EntityDescriptor::DEFAULT
};

pub const CAR_INSPECTION_DEREGISTRATION: EntityDescriptor = EntityDescriptor {
    table: "car_inspection_deregistration",
    service: "fleet.CarInspectionDeregistrationService",
    singular: "CarInspectionDeregistration",
    plural: "CarInspectionDeregistrations",
    key: &[
        text("car_id"),
        text("twodimension_code_info_valid_period_expir_date"),
    ],
    ..EntityDescriptor::DEFAULT
};

pub const CAR_INSPECTION_DEREGISTRATION_FILES: EntityDescriptor = EntityDescriptor {
    table: "car_inspection_deregistration_files",
    service: "fleet.CarInspectionDeregistrationFilesService",
    singular: "CarInspectionDeregistrationFiles",
    plural: "CarInspectionDeregistrationFiless",
    key: &[
        text("car_id"),
        text("twodimension_code_info_valid_period_expir_date"),
        text("file_uuid"),
    ],
    ..EntityDescriptor::DEFAULT
};

pub const CAR_INSPECTION_FILES: EntityDescriptor = EntityDescriptor {
    table: "car_inspection_files",
    service: "fleet.CarInspectionFilesService",
    singular: "CarInspectionFile",
    plural: "CarInspectionFiles",
    key: UUID_KEY,
    generated_key: true,
    required: &[
        text("type"),
        text("elect_cert_mg_no"),
        PUBLISHDATE[0],
        PUBLISHDATE[1],
        PUBLISHDATE[2],
        PUBLISHDATE[3],
        text("created"),
        text("modified"),
    ],
    required_on_update: Some(&[text("type"), text("modified")]),
    update: KEEP_CREATED,
    soft_delete: Some("deleted"),
    ..EntityDescriptor::DEFAULT
};

pub const CAR_INSPECTION_FILES_A: EntityDescriptor = EntityDescriptor {
    table: "car_inspection_files_a",
    service: "fleet.CarInspectionFilesAService",
    singular: "CarInspectionFilesA",
    plural: "CarInspectionFilesAs",
    key: UUID_KEY,
    generated_key: true,
    required: &[
        text("type"),
        text("elect_cert_mg_no"),
        GRANTDATE[0],
        GRANTDATE[1],
        GRANTDATE[2],
        GRANTDATE[3],
        text("created"),
        text("modified"),
    ],
    required_on_update: Some(&[text("type"), text("modified")]),
    update: KEEP_CREATED,
    soft_delete: Some("deleted"),
    ..EntityDescriptor::DEFAULT
};

pub const CAR_INSPECTION_FILES_B: EntityDescriptor = EntityDescriptor {
    table: "car_inspection_files_b",
    service: "fleet.CarInspectionFilesBService",
    singular: "CarInspectionFilesB",
    plural: "CarInspectionFilesBs",
    ..CAR_INSPECTION_FILES_A
};

// ---------------------------------------------------------------------------
// Vehicles and digital tachograph logs
// ---------------------------------------------------------------------------

pub const DTAKO_CARS_ICHIBAN_CARS: EntityDescriptor = EntityDescriptor {
    table: "dtako_cars_ichiban_cars",
    service: "fleet.DtakoCarsIchibanCarsService",
    singular: "DtakoCarsIchibanCars",
    plural: "DtakoCarsIchibanCars",
    key: &[text("id_dtako")],
    ..EntityDescriptor::DEFAULT
};

pub const DTAKOLOGS: EntityDescriptor = EntityDescriptor {
    table: "dtakologs",
    service: "fleet.DtakologsService",
    singular: "Dtakologs",
    plural: "Dtakologs",
    key: &[text("data_date_time"), text("vehicle_cd")],
    required: &[text("type")],
    ..EntityDescriptor::DEFAULT
};

pub const ICHIBAN_CARS: EntityDescriptor = EntityDescriptor {
    table: "ichiban_cars",
    service: "fleet.IchibanCarService",
    singular: "IchibanCar",
    plural: "IchibanCars",
    key: &[text("id")],
    required: &[text("id4"), text("shashu")],
    ..EntityDescriptor::DEFAULT
};

// ---------------------------------------------------------------------------
// Toll records
// ---------------------------------------------------------------------------

pub const ETC_MEISAI: EntityDescriptor = EntityDescriptor {
    table: "etc_meisai",
    service: "fleet.ETCMeisaiService",
    singular: "ETCMeisai",
    plural: "ETCMeisai",
    key: &[text("id")],
    generated_key: true,
    required: &[
        text("hash"),
        text("date_to"),
        text("date_to_date"),
        text("ic_fr"),
        text("ic_to"),
        text("etc_num"),
        number("price"),
        number("shashu"),
    ],
    unique: Some("hash"),
    lookup_method: Some("GetETCMeisaiByHash"),
    bulk_create: true,
    ..EntityDescriptor::DEFAULT
};

// ---------------------------------------------------------------------------
// Files and photos
// ---------------------------------------------------------------------------

pub const FILES: EntityDescriptor = EntityDescriptor {
    table: "files",
    service: "fleet.FileService",
    singular: "File",
    plural: "Files",
    key: UUID_KEY,
    generated_key: true,
    required: &[text("filename"), text("created"), text("type")],
    required_on_update: Some(&[text("filename"), text("type")]),
    update: KEEP_CREATED,
    soft_delete: Some("deleted"),
    ..EntityDescriptor::DEFAULT
};

pub const FLICKR_PHOTO: EntityDescriptor = EntityDescriptor {
    table: "flickr_photo",
    service: "fleet.FlickrPhotoService",
    singular: "FlickrPhoto",
    plural: "FlickrPhotos",
    key: &[text("id")],
    required: &[text("secret"), text("server")],
    ..EntityDescriptor::DEFAULT
};

// ---------------------------------------------------------------------------
// Operation records (kudg*)
// ---------------------------------------------------------------------------

const KUDG_REQUIRED: &[FieldSpec] = &[
    text("hash"),
    text("created"),
    text("kudguri_uuid"),
    text("target_driver_type"),
];

const KUDG_REQUIRED_ON_UPDATE: &[FieldSpec] = &[
    text("hash"),
    text("kudguri_uuid"),
    text("target_driver_type"),
];

const KUDG: EntityDescriptor = EntityDescriptor {
    key: UUID_KEY,
    generated_key: true,
    required: KUDG_REQUIRED,
    required_on_update: Some(KUDG_REQUIRED_ON_UPDATE),
    update: KEEP_CREATED,
    soft_delete: Some("deleted"),
    ..EntityDescriptor::DEFAULT
};

pub const KUDGCST: EntityDescriptor = EntityDescriptor {
    table: "kudgcst",
    service: "fleet.KudgcstService",
    singular: "Kudgcst",
    plural: "Kudgcsts",
    ..KUDG
};

pub const KUDGFRY: EntityDescriptor = EntityDescriptor {
    table: "kudgfry",
    service: "fleet.KudgfryService",
    singular: "Kudgfry",
    plural: "Kudgfrys",
    ..KUDG
};

pub const KUDGFUL: EntityDescriptor = EntityDescriptor {
    table: "kudgful",
    service: "fleet.KudgfulService",
    singular: "Kudgful",
    plural: "Kudgfuls",
    ..KUDG
};

pub const KUDGIVT: EntityDescriptor = EntityDescriptor {
    table: "kudgivt",
    service: "fleet.KudgivtService",
    singular: "Kudgivt",
    plural: "Kudgivts",
    ..KUDG
};

pub const KUDGSIR: EntityDescriptor = EntityDescriptor {
    table: "kudgsir",
    service: "fleet.KudgsirService",
    singular: "Kudgsir",
    plural: "Kudgsirs",
    ..KUDG
};

pub const KUDGURI: EntityDescriptor = EntityDescriptor {
    table: "kudguri",
    service: "fleet.KudguriService",
    singular: "Kudguri",
    plural: "Kudguris",
    required: &[
        text("hash"),
        text("created"),
        text("kudguri_uuid"),
        text("unkou_no"),
        text("target_driver_type"),
    ],
    required_on_update: Some(&[
        text("hash"),
        text("kudguri_uuid"),
        text("unkou_no"),
        text("target_driver_type"),
    ]),
    ..KUDG
};

// ---------------------------------------------------------------------------
// Sales
// ---------------------------------------------------------------------------

pub const URIAGE: EntityDescriptor = EntityDescriptor {
    table: "uriage",
    service: "fleet.UriageService",
    singular: "Uriage",
    plural: "Uriages",
    key: &[text("name"), text("bumon"), text("date")],
    ..EntityDescriptor::DEFAULT
};

pub const URIAGE_JISHA: EntityDescriptor = EntityDescriptor {
    table: "uriage_jisha",
    service: "fleet.UriageJishaService",
    singular: "UriageJisha",
    plural: "UriageJishas",
    key: &[text("bumon"), text("date")],
    ..EntityDescriptor::DEFAULT
};

/// Every registered entity.
pub const ALL: &[&EntityDescriptor] = &[
    &CAM_FILE,
    &CAM_FILE_EXE,
    &CAM_FILE_EXE_STAGE,
    &CAR_INS_SHEET_ICHIBAN_CARS,
    &CAR_INS_SHEET_ICHIBAN_CARS_A,
    &CAR_INSPECTION,
    &CAR_INSPECTION_DEREGISTRATION,
    &CAR_INSPECTION_DEREGISTRATION_FILES,
    &CAR_INSPECTION_FILES,
    &CAR_INSPECTION_FILES_A,
    &CAR_INSPECTION_FILES_B,
    &DTAKO_CARS_ICHIBAN_CARS,
    &DTAKOLOGS,
    &ETC_MEISAI,
    &FILES,
    &FLICKR_PHOTO,
    &ICHIBAN_CARS,
    &KUDGCST,
    &KUDGFRY,
    &KUDGFUL,
    &KUDGIVT,
    &KUDGSIR,
    &KUDGURI,
    &URIAGE,
    &URIAGE_JISHA,
];

pub fn by_service(service: &str) -> Option<&'static EntityDescriptor> {
    ALL.iter().copied().find(|d| d.service == service)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn names_are_unique() {
        let tables: HashSet<_> = ALL.iter().map(|d| d.table).collect();
        let services: HashSet<_> = ALL.iter().map(|d| d.service).collect();
        assert_eq!(tables.len(), ALL.len());
        assert_eq!(services.len(), ALL.len());
    }

    #[test]
    fn every_entity_has_a_key() {
        for d in ALL {
            assert!(!d.key.is_empty(), "{} has no key", d.table);
            if d.generated_key {
                assert_eq!(d.key.len(), 1, "{} generated key must be single", d.table);
            }
        }
    }

    #[test]
    fn lookup_requires_a_unique_field() {
        for d in ALL {
            if d.lookup_method.is_some() || d.bulk_create {
                assert!(d.unique.is_some(), "{} lookup without unique", d.table);
            }
        }
    }

    #[test]
    fn service_lookup() {
        assert_eq!(
            by_service("fleet.CamFileService").map(|d| d.table),
            Some("cam_file")
        );
        assert!(by_service("fleet.Nope").is_none());
    }
}
