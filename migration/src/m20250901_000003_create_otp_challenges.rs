use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum OtpChallenges {
    Table,
    Id,
    Phone,
    Code,
    IssuedAt,
    ExpiresAt,
    Consumed,
    ConsumedAt,
    Invalidated,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

/// 验证码记录只增不删，过期记录保留作审计
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(OtpChallenges::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OtpChallenges::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(OtpChallenges::Phone).string_len(20).not_null())
                    .col(ColumnDef::new(OtpChallenges::Code).string_len(6).not_null())
                    .col(
                        ColumnDef::new(OtpChallenges::IssuedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(OtpChallenges::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OtpChallenges::Consumed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(OtpChallenges::ConsumedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(OtpChallenges::Invalidated)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_otp_challenges_phone_consumed")
                    .table(OtpChallenges::Table)
                    .col(OtpChallenges::Phone)
                    .col(OtpChallenges::Consumed)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OtpChallenges::Table).to_owned())
            .await
    }
}
