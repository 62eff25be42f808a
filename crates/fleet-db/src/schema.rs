//! Schema definitions and migration runner.
//!
//! Tables are SCHEMAFULL except for entity payloads, which are opaque
//! objects. UUIDs are stored as strings. Operations that must write more
//! than one row atomically are stored functions: a function call is a
//! single statement and therefore a single transaction.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "identity_and_organizations",
        sql: SCHEMA_V1,
    },
    Migration {
        version: 2,
        name: "fleet_entities",
        sql: SCHEMA_V2,
    },
];

// -----------------------------------------------------------------------
// v1: users, provider linkages, organizations, memberships, invitations
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
DEFINE TABLE app_user SCHEMAFULL;
DEFINE FIELD iam_email ON TABLE app_user TYPE string;
DEFINE FIELD email ON TABLE app_user TYPE option<string>;
DEFINE FIELD display_name ON TABLE app_user TYPE string;
DEFINE FIELD avatar_url ON TABLE app_user TYPE option<string>;
DEFINE FIELD is_superadmin ON TABLE app_user TYPE bool DEFAULT false;
DEFINE FIELD created_at ON TABLE app_user TYPE datetime DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE app_user TYPE datetime DEFAULT time::now();
DEFINE FIELD deleted_at ON TABLE app_user TYPE option<datetime>;
DEFINE INDEX idx_app_user_iam_email ON TABLE app_user COLUMNS iam_email;

DEFINE TABLE oauth_account SCHEMAFULL;
DEFINE FIELD app_user_id ON TABLE oauth_account TYPE string;
DEFINE FIELD provider ON TABLE oauth_account TYPE string \
    ASSERT $value IN ['google', 'line'];
DEFINE FIELD provider_user_id ON TABLE oauth_account TYPE string;
DEFINE FIELD email ON TABLE oauth_account TYPE option<string>;
DEFINE FIELD access_token ON TABLE oauth_account TYPE option<string>;
DEFINE FIELD refresh_token ON TABLE oauth_account TYPE option<string>;
DEFINE FIELD token_expires_at ON TABLE oauth_account TYPE option<datetime>;
DEFINE FIELD created_at ON TABLE oauth_account TYPE datetime DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE oauth_account TYPE datetime DEFAULT time::now();
DEFINE INDEX idx_oauth_account_provider_user ON TABLE oauth_account \
    COLUMNS provider, provider_user_id UNIQUE;
DEFINE INDEX idx_oauth_account_user ON TABLE oauth_account COLUMNS app_user_id;

DEFINE TABLE organization SCHEMAFULL;
DEFINE FIELD name ON TABLE organization TYPE string;
DEFINE FIELD slug ON TABLE organization TYPE string;
DEFINE FIELD created_at ON TABLE organization TYPE datetime DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE organization TYPE datetime DEFAULT time::now();
DEFINE FIELD deleted_at ON TABLE organization TYPE option<datetime>;
DEFINE INDEX idx_organization_slug ON TABLE organization COLUMNS slug UNIQUE;

DEFINE TABLE user_organization SCHEMAFULL;
DEFINE FIELD user_id ON TABLE user_organization TYPE string;
DEFINE FIELD organization_id ON TABLE user_organization TYPE string;
DEFINE FIELD role ON TABLE user_organization TYPE string;
DEFINE FIELD is_default ON TABLE user_organization TYPE bool DEFAULT false;
DEFINE FIELD created_at ON TABLE user_organization TYPE datetime DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE user_organization TYPE datetime DEFAULT time::now();
DEFINE INDEX idx_user_organization_pair ON TABLE user_organization \
    COLUMNS user_id, organization_id UNIQUE;
DEFINE INDEX idx_user_organization_org ON TABLE user_organization \
    COLUMNS organization_id;

DEFINE TABLE invitation SCHEMAFULL;
DEFINE FIELD organization_id ON TABLE invitation TYPE string;
DEFINE FIELD email ON TABLE invitation TYPE string;
DEFINE FIELD role ON TABLE invitation TYPE string;
DEFINE FIELD invite_token ON TABLE invitation TYPE string;
DEFINE FIELD invited_by ON TABLE invitation TYPE string;
DEFINE FIELD status ON TABLE invitation TYPE string \
    ASSERT $value IN ['pending', 'accepted', 'cancelled', 'expired'];
DEFINE FIELD expires_at ON TABLE invitation TYPE datetime;
DEFINE FIELD accepted_at ON TABLE invitation TYPE option<datetime>;
DEFINE FIELD accepted_by ON TABLE invitation TYPE option<string>;
DEFINE FIELD created_at ON TABLE invitation TYPE datetime DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE invitation TYPE datetime DEFAULT time::now();
DEFINE INDEX idx_invitation_token ON TABLE invitation COLUMNS invite_token UNIQUE;
DEFINE INDEX idx_invitation_org_email ON TABLE invitation \
    COLUMNS organization_id, email;

DEFINE FUNCTION fn::create_user_with_account(
    $user_id: string,
    $iam_email: string,
    $email: option<string>,
    $display_name: string,
    $avatar_url: option<string>,
    $account_id: string,
    $provider: string,
    $provider_user_id: string,
    $access_token: option<string>,
    $refresh_token: option<string>,
    $token_expires_at: option<datetime>
) {
    CREATE type::record('app_user', $user_id) SET
        iam_email = $iam_email,
        email = $email,
        display_name = $display_name,
        avatar_url = $avatar_url,
        is_superadmin = false;
    CREATE type::record('oauth_account', $account_id) SET
        app_user_id = $user_id,
        provider = $provider,
        provider_user_id = $provider_user_id,
        email = $email,
        access_token = $access_token,
        refresh_token = $refresh_token,
        token_expires_at = $token_expires_at;
    RETURN $user_id;
};

DEFINE FUNCTION fn::create_organization_with_owner(
    $org_id: string,
    $name: string,
    $slug: string,
    $membership_id: string,
    $owner: string
) {
    CREATE type::record('organization', $org_id) SET name = $name, slug = $slug;
    UPDATE user_organization SET is_default = false, updated_at = time::now() \
        WHERE user_id = $owner AND is_default = true;
    CREATE type::record('user_organization', $membership_id) SET
        user_id = $owner,
        organization_id = $org_id,
        role = 'owner',
        is_default = true;
    RETURN $org_id;
};

DEFINE FUNCTION fn::accept_invitation(
    $id: string,
    $accepted_by: string,
    $membership_id: string,
    $now: datetime
) {
    LET $found = (SELECT * FROM type::record('invitation', $id));
    IF array::len($found) = 0 { THROW 'fleet:invitation_not_found'; };
    LET $inv = $found[0];
    LET $member = (SELECT id FROM user_organization \
        WHERE user_id = $accepted_by AND organization_id = $inv.organization_id);
    IF array::len($member) > 0 { THROW 'fleet:already_member'; };
    IF $inv.status != 'pending' { THROW 'fleet:invitation_used'; };
    IF $inv.expires_at <= $now { THROW 'fleet:invitation_expired'; };
    UPDATE type::record('invitation', $id) SET
        status = 'accepted',
        accepted_at = $now,
        accepted_by = $accepted_by,
        updated_at = time::now();
    CREATE type::record('user_organization', $membership_id) SET
        user_id = $accepted_by,
        organization_id = $inv.organization_id,
        role = $inv.role,
        is_default = false;
    RETURN $membership_id;
};
";

// -----------------------------------------------------------------------
// v2: descriptor-driven fleet entities
// -----------------------------------------------------------------------

/// Every fleet entity lives in one table. Rows are addressed by a record
/// id derived from `(kind, tenant, key)`; `unique_value` holds either the
/// entity's unique field or, when it has none, the key itself.
const SCHEMA_V2: &str = "\
DEFINE TABLE entity_record SCHEMAFULL;
DEFINE FIELD kind ON TABLE entity_record TYPE string;
DEFINE FIELD tenant_id ON TABLE entity_record TYPE string;
DEFINE FIELD entity_key ON TABLE entity_record TYPE string;
DEFINE FIELD unique_value ON TABLE entity_record TYPE string;
DEFINE FIELD payload ON TABLE entity_record TYPE object FLEXIBLE DEFAULT {};
DEFINE FIELD created_at ON TABLE entity_record TYPE datetime DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE entity_record TYPE datetime DEFAULT time::now();
DEFINE FIELD deleted_at ON TABLE entity_record TYPE option<datetime>;
DEFINE INDEX idx_entity_record_unique ON TABLE entity_record \
    COLUMNS kind, tenant_id, unique_value UNIQUE;
DEFINE INDEX idx_entity_record_tenant ON TABLE entity_record \
    COLUMNS kind, tenant_id, created_at;
";

/// Apply every migration newer than the recorded version.
///
/// Safe to call on every start-up.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let mut result = db
        .query("SELECT version FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let applied: Vec<MigrationRecord> = result.take(0)?;
    let current = applied.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        info!(
            version = migration.version,
            name = migration.name,
            "applying migration"
        );
        db.query(migration.sql).await?.check().map_err(|e| {
            DbError::Migration(format!(
                "v{} '{}': {e}",
                migration.version, migration.name
            ))
        })?;

        db.query("CREATE _migration SET version = $version, name = $name")
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!("recording v{}: {e}", migration.version))
            })?;
    }

    Ok(())
}
