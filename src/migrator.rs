use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260101_000001_create_warehouses_table::Migration),
            Box::new(m20260101_000002_create_products_table::Migration),
            Box::new(m20260101_000003_create_inventory_documents_table::Migration),
            Box::new(m20260101_000004_create_inventory_document_lines_table::Migration),
            Box::new(m20260101_000005_create_stock_movements_table::Migration),
            Box::new(m20260101_000006_create_material_movements_tables::Migration),
            Box::new(m20260101_000007_create_document_number_sequences_table::Migration),
        ]
    }
}

// Migration implementations

mod m20260101_000001_create_warehouses_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20260101_000001_create_warehouses_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Warehouses::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Warehouses::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Warehouses::Code)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Warehouses::Name).string().not_null())
                        .col(ColumnDef::new(Warehouses::CreatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Warehouses::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Warehouses {
        Table,
        Id,
        Code,
        Name,
        CreatedAt,
    }
}

mod m20260101_000002_create_products_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20260101_000002_create_products_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Products::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Products::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(Products::Sku)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Products::Name).string().not_null())
                        .col(ColumnDef::new(Products::CreatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Products::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Products {
        Table,
        Id,
        Sku,
        Name,
        CreatedAt,
    }
}

mod m20260101_000003_create_inventory_documents_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20260101_000003_create_inventory_documents_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(InventoryDocuments::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InventoryDocuments::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryDocuments::DocumentNumber)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(InventoryDocuments::DocumentType)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryDocuments::DocumentDate)
                                .date()
                                .not_null(),
                        )
                        .col(ColumnDef::new(InventoryDocuments::WarehouseId).uuid().null())
                        .col(ColumnDef::new(InventoryDocuments::EventId).uuid().null())
                        .col(
                            ColumnDef::new(InventoryDocuments::DeliveredByName)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(InventoryDocuments::DeliveredBySignature)
                                .text()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(InventoryDocuments::ReceivedByName)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(InventoryDocuments::ReceivedBySignature)
                                .text()
                                .null(),
                        )
                        .col(ColumnDef::new(InventoryDocuments::Notes).string().null())
                        .col(
                            ColumnDef::new(InventoryDocuments::Status)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryDocuments::MovementsEmittedAt)
                                .timestamp()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(InventoryDocuments::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryDocuments::UpdatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_inventory_documents_status")
                        .table(InventoryDocuments::Table)
                        .col(InventoryDocuments::Status)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_inventory_documents_event_id")
                        .table(InventoryDocuments::Table)
                        .col(InventoryDocuments::EventId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(InventoryDocuments::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum InventoryDocuments {
        Table,
        Id,
        DocumentNumber,
        DocumentType,
        DocumentDate,
        WarehouseId,
        EventId,
        DeliveredByName,
        DeliveredBySignature,
        ReceivedByName,
        ReceivedBySignature,
        Notes,
        Status,
        MovementsEmittedAt,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20260101_000004_create_inventory_document_lines_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20260101_000004_create_inventory_document_lines_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(InventoryDocumentLines::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InventoryDocumentLines::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryDocumentLines::DocumentId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryDocumentLines::ProductId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryDocumentLines::Quantity)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryDocumentLines::Observation)
                                .string()
                                .null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_document_lines_document_id")
                                .from(
                                    InventoryDocumentLines::Table,
                                    InventoryDocumentLines::DocumentId,
                                )
                                .to(InventoryDocuments::Table, InventoryDocuments::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            // One line per product per document
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_document_lines_document_product")
                        .table(InventoryDocumentLines::Table)
                        .col(InventoryDocumentLines::DocumentId)
                        .col(InventoryDocumentLines::ProductId)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(InventoryDocumentLines::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum InventoryDocumentLines {
        Table,
        Id,
        DocumentId,
        ProductId,
        Quantity,
        Observation,
    }

    #[derive(DeriveIden)]
    enum InventoryDocuments {
        Table,
        Id,
    }
}

mod m20260101_000005_create_stock_movements_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20260101_000005_create_stock_movements_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(StockMovements::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockMovements::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockMovements::DocumentId).uuid().not_null())
                        .col(
                            ColumnDef::new(StockMovements::WarehouseId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockMovements::ProductId).uuid().not_null())
                        .col(ColumnDef::new(StockMovements::Direction).string().not_null())
                        .col(ColumnDef::new(StockMovements::Quantity).integer().not_null())
                        .col(
                            ColumnDef::new(StockMovements::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stock_movements_document_id")
                        .table(StockMovements::Table)
                        .col(StockMovements::DocumentId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stock_movements_warehouse_product")
                        .table(StockMovements::Table)
                        .col(StockMovements::WarehouseId)
                        .col(StockMovements::ProductId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(StockMovements::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum StockMovements {
        Table,
        Id,
        DocumentId,
        WarehouseId,
        ProductId,
        Direction,
        Quantity,
        CreatedAt,
    }
}

mod m20260101_000006_create_material_movements_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20260101_000006_create_material_movements_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(MaterialMovements::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(MaterialMovements::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(MaterialMovements::EventId).uuid().not_null())
                        .col(
                            ColumnDef::new(MaterialMovements::MovementType)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(MaterialMovements::Category).string().null())
                        .col(
                            ColumnDef::new(MaterialMovements::Subtotal)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MaterialMovements::Iva)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MaterialMovements::Total)
                                .decimal()
                                .not_null(),
                        )
                        .col(ColumnDef::new(MaterialMovements::Notes).string().null())
                        .col(
                            ColumnDef::new(MaterialMovements::InventoryDocumentId)
                                .uuid()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(MaterialMovements::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_material_movements_event_type")
                        .table(MaterialMovements::Table)
                        .col(MaterialMovements::EventId)
                        .col(MaterialMovements::MovementType)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(MaterialMovementLines::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(MaterialMovementLines::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MaterialMovementLines::MovementId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MaterialMovementLines::ProductId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MaterialMovementLines::Quantity)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MaterialMovementLines::UnitCost)
                                .decimal()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_movement_lines_movement_id")
                                .from(
                                    MaterialMovementLines::Table,
                                    MaterialMovementLines::MovementId,
                                )
                                .to(MaterialMovements::Table, MaterialMovements::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_material_movement_lines_movement_product")
                        .table(MaterialMovementLines::Table)
                        .col(MaterialMovementLines::MovementId)
                        .col(MaterialMovementLines::ProductId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(MaterialMovementLines::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(MaterialMovements::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum MaterialMovements {
        Table,
        Id,
        EventId,
        MovementType,
        Category,
        Subtotal,
        Iva,
        Total,
        Notes,
        InventoryDocumentId,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum MaterialMovementLines {
        Table,
        Id,
        MovementId,
        ProductId,
        Quantity,
        UnitCost,
    }
}

mod m20260101_000007_create_document_number_sequences_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20260101_000007_create_document_number_sequences_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(DocumentNumberSequences::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(DocumentNumberSequences::DocumentType)
                                .string()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DocumentNumberSequences::NextValue)
                                .big_integer()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(
                    Table::drop()
                        .table(DocumentNumberSequences::Table)
                        .to_owned(),
                )
                .await
        }
    }

    #[derive(DeriveIden)]
    enum DocumentNumberSequences {
        Table,
        DocumentType,
        NextValue,
    }
}
