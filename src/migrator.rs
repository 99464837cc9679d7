use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240301_000001_create_inventory_snapshots_table::Migration),
            Box::new(m20240301_000002_create_ledger_tables::Migration),
            Box::new(m20240301_000003_create_audit_logs_table::Migration),
        ]
    }
}

mod m20240301_000001_create_inventory_snapshots_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000001_create_inventory_snapshots_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            // Matches entities/inventory_snapshot.rs
            manager
                .create_table(
                    Table::create()
                        .table(InventorySnapshots::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InventorySnapshots::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(InventorySnapshots::BaseId).string().not_null())
                        .col(
                            ColumnDef::new(InventorySnapshots::AssetType)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventorySnapshots::OpeningBalance)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(InventorySnapshots::Purchases)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(InventorySnapshots::TransferIn)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(InventorySnapshots::TransferOut)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(InventorySnapshots::Assigned)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(InventorySnapshots::Expended)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(InventorySnapshots::ClosingBalance)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(InventorySnapshots::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventorySnapshots::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            // One snapshot per (base, asset type)
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_inventory_snapshots_base_asset")
                        .table(InventorySnapshots::Table)
                        .col(InventorySnapshots::BaseId)
                        .col(InventorySnapshots::AssetType)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(InventorySnapshots::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum InventorySnapshots {
        Table,
        Id,
        BaseId,
        AssetType,
        OpeningBalance,
        Purchases,
        TransferIn,
        TransferOut,
        Assigned,
        Expended,
        ClosingBalance,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240301_000002_create_ledger_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000002_create_ledger_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Purchases::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Purchases::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Purchases::BaseId).string().not_null())
                        .col(ColumnDef::new(Purchases::AssetType).string().not_null())
                        .col(ColumnDef::new(Purchases::Quantity).big_integer().null())
                        .col(ColumnDef::new(Purchases::RecordedBy).string().not_null())
                        .col(
                            ColumnDef::new(Purchases::Date)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_purchases_base_date")
                        .table(Purchases::Table)
                        .col(Purchases::BaseId)
                        .col(Purchases::Date)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Transfers::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Transfers::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Transfers::FromBaseId).string().not_null())
                        .col(ColumnDef::new(Transfers::ToBaseId).string().not_null())
                        .col(ColumnDef::new(Transfers::AssetType).string().not_null())
                        .col(ColumnDef::new(Transfers::Quantity).big_integer().null())
                        .col(ColumnDef::new(Transfers::RecordedBy).string().not_null())
                        .col(
                            ColumnDef::new(Transfers::Date)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_transfers_from_base_date")
                        .table(Transfers::Table)
                        .col(Transfers::FromBaseId)
                        .col(Transfers::Date)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_transfers_to_base_date")
                        .table(Transfers::Table)
                        .col(Transfers::ToBaseId)
                        .col(Transfers::Date)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Assignments::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Assignments::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Assignments::BaseId).string().not_null())
                        .col(ColumnDef::new(Assignments::AssetType).string().not_null())
                        .col(ColumnDef::new(Assignments::Quantity).big_integer().null())
                        .col(ColumnDef::new(Assignments::AssignedTo).string().not_null())
                        .col(
                            ColumnDef::new(Assignments::Kind)
                                .string()
                                .not_null()
                                .default("assigned"),
                        )
                        .col(ColumnDef::new(Assignments::RecordedBy).string().not_null())
                        .col(
                            ColumnDef::new(Assignments::Date)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_assignments_base_date")
                        .table(Assignments::Table)
                        .col(Assignments::BaseId)
                        .col(Assignments::Date)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Assignments::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Transfers::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Purchases::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Purchases {
        Table,
        Id,
        BaseId,
        AssetType,
        Quantity,
        RecordedBy,
        Date,
    }

    #[derive(DeriveIden)]
    enum Transfers {
        Table,
        Id,
        FromBaseId,
        ToBaseId,
        AssetType,
        Quantity,
        RecordedBy,
        Date,
    }

    #[derive(DeriveIden)]
    enum Assignments {
        Table,
        Id,
        BaseId,
        AssetType,
        Quantity,
        AssignedTo,
        Kind,
        RecordedBy,
        Date,
    }
}

mod m20240301_000003_create_audit_logs_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000003_create_audit_logs_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(AuditLogs::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(AuditLogs::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(AuditLogs::Action).string().not_null())
                        .col(ColumnDef::new(AuditLogs::UserId).string().not_null())
                        .col(ColumnDef::new(AuditLogs::Details).json().not_null())
                        .col(
                            ColumnDef::new(AuditLogs::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_audit_logs_created_at")
                        .table(AuditLogs::Table)
                        .col(AuditLogs::CreatedAt)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(AuditLogs::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum AuditLogs {
        Table,
        Id,
        Action,
        UserId,
        Details,
        CreatedAt,
    }
}
