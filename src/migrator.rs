use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240301_000001_create_obras_table::Migration),
            Box::new(m20240301_000002_create_equipamentos_table::Migration),
            Box::new(m20240301_000003_create_viaturas_table::Migration),
            Box::new(m20240301_000004_create_materiais_table::Migration),
            Box::new(m20240301_000005_create_movement_tables::Migration),
            Box::new(m20240301_000006_create_users_table::Migration),
        ]
    }
}

// Migration implementations

mod m20240301_000001_create_obras_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000001_create_obras_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Obras::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Obras::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(Obras::Codigo)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Obras::Nome).string().not_null())
                        .col(ColumnDef::new(Obras::Endereco).string().null())
                        .col(ColumnDef::new(Obras::Cliente).string().null())
                        .col(ColumnDef::new(Obras::Estado).string().not_null())
                        .col(ColumnDef::new(Obras::CreatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Obras::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Obras {
        Table,
        Id,
        Codigo,
        Nome,
        Endereco,
        Cliente,
        Estado,
        CreatedAt,
    }
}

mod m20240301_000002_create_equipamentos_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000002_create_equipamentos_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Equipamentos::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Equipamentos::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Equipamentos::Codigo)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Equipamentos::Descricao).string().not_null())
                        .col(ColumnDef::new(Equipamentos::Marca).string().null())
                        .col(ColumnDef::new(Equipamentos::Modelo).string().null())
                        .col(ColumnDef::new(Equipamentos::Categoria).string().null())
                        .col(ColumnDef::new(Equipamentos::NumeroSerie).string().null())
                        .col(
                            ColumnDef::new(Equipamentos::EstadoConservacao)
                                .string()
                                .null(),
                        )
                        .col(ColumnDef::new(Equipamentos::Responsavel).string().null())
                        .col(
                            ColumnDef::new(Equipamentos::Ativo)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Equipamentos::EmManutencao)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Equipamentos::MotivoManutencao)
                                .string()
                                .null(),
                        )
                        .col(ColumnDef::new(Equipamentos::ObraId).uuid().null())
                        .col(
                            ColumnDef::new(Equipamentos::CreatedAt)
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
                        .name("idx_equipamentos_obra_id")
                        .table(Equipamentos::Table)
                        .col(Equipamentos::ObraId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Equipamentos::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Equipamentos {
        Table,
        Id,
        Codigo,
        Descricao,
        Marca,
        Modelo,
        Categoria,
        NumeroSerie,
        EstadoConservacao,
        Responsavel,
        Ativo,
        EmManutencao,
        MotivoManutencao,
        ObraId,
        CreatedAt,
    }
}

mod m20240301_000003_create_viaturas_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000003_create_viaturas_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Viaturas::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Viaturas::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(Viaturas::Matricula)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Viaturas::Marca).string().null())
                        .col(ColumnDef::new(Viaturas::Modelo).string().null())
                        .col(
                            ColumnDef::new(Viaturas::Combustivel)
                                .string()
                                .not_null()
                                .default("Gasoleo"),
                        )
                        .col(
                            ColumnDef::new(Viaturas::Ativo)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Viaturas::EmManutencao)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Viaturas::MotivoManutencao).string().null())
                        .col(ColumnDef::new(Viaturas::ObraId).uuid().null())
                        .col(
                            ColumnDef::new(Viaturas::KmsAtual)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Viaturas::ProximaRevisaoKms)
                                .big_integer()
                                .null(),
                        )
                        .col(ColumnDef::new(Viaturas::DataVistoria).date().null())
                        .col(ColumnDef::new(Viaturas::DataSeguro).date().null())
                        .col(ColumnDef::new(Viaturas::DataProximaRevisao).date().null())
                        .col(ColumnDef::new(Viaturas::ApoliceSeguro).string().null())
                        .col(ColumnDef::new(Viaturas::Observacoes).string().null())
                        .col(ColumnDef::new(Viaturas::CreatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_viaturas_obra_id")
                        .table(Viaturas::Table)
                        .col(Viaturas::ObraId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Viaturas::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Viaturas {
        Table,
        Id,
        Matricula,
        Marca,
        Modelo,
        Combustivel,
        Ativo,
        EmManutencao,
        MotivoManutencao,
        ObraId,
        KmsAtual,
        ProximaRevisaoKms,
        DataVistoria,
        DataSeguro,
        DataProximaRevisao,
        ApoliceSeguro,
        Observacoes,
        CreatedAt,
    }
}

mod m20240301_000004_create_materiais_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000004_create_materiais_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Materiais::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Materiais::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Materiais::Codigo)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Materiais::Descricao).string().not_null())
                        .col(
                            ColumnDef::new(Materiais::Unidade)
                                .string()
                                .not_null()
                                .default("unidade"),
                        )
                        .col(
                            ColumnDef::new(Materiais::StockAtual)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Materiais::StockMinimo)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Materiais::Ativo)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(ColumnDef::new(Materiais::CreatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Materiais::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Materiais {
        Table,
        Id,
        Codigo,
        Descricao,
        Unidade,
        StockAtual,
        StockMinimo,
        Ativo,
        CreatedAt,
    }
}

mod m20240301_000005_create_movement_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000005_create_movement_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            // Resource movement ledger
            manager
                .create_table(
                    Table::create()
                        .table(MovimentosAtivos::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(MovimentosAtivos::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MovimentosAtivos::ResourceType)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MovimentosAtivos::ResourceId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(MovimentosAtivos::Kind).string().not_null())
                        .col(ColumnDef::new(MovimentosAtivos::ObraId).uuid().not_null())
                        .col(ColumnDef::new(MovimentosAtivos::Actor).string().null())
                        .col(ColumnDef::new(MovimentosAtivos::Notas).string().null())
                        .col(
                            ColumnDef::new(MovimentosAtivos::CreatedAt)
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
                        .name("idx_movimentos_ativos_resource")
                        .table(MovimentosAtivos::Table)
                        .col(MovimentosAtivos::ResourceId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_movimentos_ativos_obra_id")
                        .table(MovimentosAtivos::Table)
                        .col(MovimentosAtivos::ObraId)
                        .to_owned(),
                )
                .await?;

            // Stock movement ledger
            manager
                .create_table(
                    Table::create()
                        .table(MovimentosStock::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(MovimentosStock::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MovimentosStock::MaterialId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(MovimentosStock::Direcao).string().not_null())
                        .col(
                            ColumnDef::new(MovimentosStock::Quantidade)
                                .decimal()
                                .not_null(),
                        )
                        .col(ColumnDef::new(MovimentosStock::ObraId).uuid().null())
                        .col(ColumnDef::new(MovimentosStock::Actor).string().null())
                        .col(ColumnDef::new(MovimentosStock::Notas).string().null())
                        .col(
                            ColumnDef::new(MovimentosStock::PreviousStock)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MovimentosStock::NewStock)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MovimentosStock::CreatedAt)
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
                        .name("idx_movimentos_stock_material_id")
                        .table(MovimentosStock::Table)
                        .col(MovimentosStock::MaterialId)
                        .to_owned(),
                )
                .await?;

            // Vehicle trip log
            manager
                .create_table(
                    Table::create()
                        .table(MovimentosViatura::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(MovimentosViatura::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MovimentosViatura::VehicleId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MovimentosViatura::Condutor)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(MovimentosViatura::ObraId).uuid().null())
                        .col(
                            ColumnDef::new(MovimentosViatura::KmInicial)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MovimentosViatura::KmFinal)
                                .big_integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(MovimentosViatura::Notas).string().null())
                        .col(
                            ColumnDef::new(MovimentosViatura::CreatedAt)
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
                        .name("idx_movimentos_viatura_vehicle_id")
                        .table(MovimentosViatura::Table)
                        .col(MovimentosViatura::VehicleId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(MovimentosViatura::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(MovimentosStock::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(MovimentosAtivos::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum MovimentosAtivos {
        Table,
        Id,
        ResourceType,
        ResourceId,
        Kind,
        ObraId,
        Actor,
        Notas,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum MovimentosStock {
        Table,
        Id,
        MaterialId,
        Direcao,
        Quantidade,
        ObraId,
        Actor,
        Notas,
        PreviousStock,
        NewStock,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum MovimentosViatura {
        Table,
        Id,
        VehicleId,
        Condutor,
        ObraId,
        KmInicial,
        KmFinal,
        Notas,
        CreatedAt,
    }
}

mod m20240301_000006_create_users_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000006_create_users_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Users::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Users::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(Users::Email)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Users::Name).string().not_null())
                        .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                        .col(ColumnDef::new(Users::Roles).string().not_null())
                        .col(ColumnDef::new(Users::CreatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Users::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Users {
        Table,
        Id,
        Email,
        Name,
        PasswordHash,
        Roles,
        CreatedAt,
    }
}
