//! Read-only projections over the ledger for dashboards.

use super::auth::Caller;
use super::engine::LedgerEngine;
use crate::domain::ledger::LedgerEntry;
use crate::domain::money::Balance;
use crate::domain::payout::{PayoutRequest, PayoutStatus};
use crate::domain::revenue::{CourseId, RevenueRecord};
use crate::domain::wallet::{InstructorId, Wallet};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::HashMap;

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const MAX_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WalletSummary {
    pub instructor: InstructorId,
    pub available_balance: Balance,
    pub pending_balance: Balance,
    pub total_earned: Balance,
    pub withdrawable_balance: Balance,
}

impl From<&Wallet> for WalletSummary {
    fn from(wallet: &Wallet) -> Self {
        Self {
            instructor: wallet.instructor(),
            available_balance: wallet.available(),
            pending_balance: wallet.pending(),
            total_earned: wallet.total_earned(),
            withdrawable_balance: wallet.withdrawable(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct PageRequest {
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

impl PageRequest {
    /// 1-based page number and a page size within `1..=MAX_PAGE_SIZE`.
    fn normalized(&self) -> (usize, usize) {
        let page = self.page.unwrap_or(1).max(1);
        let size = self
            .page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        (page, size)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub page_size: usize,
    pub total: usize,
}

impl<T> Page<T> {
    fn slice(all: Vec<T>, request: PageRequest) -> Self {
        let (page, page_size) = request.normalized();
        let total = all.len();
        let items = all
            .into_iter()
            .skip((page - 1).saturating_mul(page_size))
            .take(page_size)
            .collect();
        Self {
            items,
            page,
            page_size,
            total,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevenueTotals {
    pub sales_count: usize,
    pub total_amount: Balance,
    pub commission_amount: Balance,
    pub instructor_earnings: Balance,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseRevenue {
    pub course_id: CourseId,
    pub course_title: Option<String>,
    pub instructor: InstructorId,
    pub sales_count: usize,
    pub total_amount: Balance,
    pub commission_amount: Balance,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstructorRevenue {
    pub instructor: InstructorId,
    pub sales_count: usize,
    pub total_amount: Balance,
    pub commission_amount: Balance,
    pub instructor_share: Balance,
    pub paid_amount: Balance,
    pub outstanding_amount: Balance,
}

fn newest_first(payouts: &mut [PayoutRequest]) {
    payouts.sort_by_key(|p| Reverse((p.created_at, p.id)));
}

impl LedgerEngine {
    /// Balances of the caller's wallet; zeros when nothing was earned yet.
    pub async fn wallet_summary(&self, caller: &Caller) -> Result<WalletSummary> {
        let instructor = caller.instructor_id()?;
        let wallet = self
            .store
            .wallet(instructor)
            .await?
            .unwrap_or_else(|| Wallet::new(instructor));
        Ok(WalletSummary::from(&wallet))
    }

    /// The caller's ledger entries, newest first.
    pub async fn wallet_transactions(
        &self,
        caller: &Caller,
        request: PageRequest,
    ) -> Result<Page<LedgerEntry>> {
        let instructor = caller.instructor_id()?;
        let mut entries = self.store.ledger_entries(instructor).await?;
        entries.reverse();
        Ok(Page::slice(entries, request))
    }

    /// The caller's payouts, newest first.
    pub async fn payout_history(&self, caller: &Caller) -> Result<Vec<PayoutRequest>> {
        let instructor = caller.instructor_id()?;
        let mut payouts: Vec<_> = self
            .store
            .payouts()
            .await?
            .into_iter()
            .filter(|p| p.instructor == instructor)
            .collect();
        newest_first(&mut payouts);
        Ok(payouts)
    }

    /// Every payout, optionally filtered by status, newest first.
    pub async fn admin_payouts(
        &self,
        caller: &Caller,
        status: Option<PayoutStatus>,
    ) -> Result<Vec<PayoutRequest>> {
        caller.require_admin()?;
        let mut payouts: Vec<_> = self
            .store
            .payouts()
            .await?
            .into_iter()
            .filter(|p| status.is_none_or(|s| p.status == s))
            .collect();
        newest_first(&mut payouts);
        Ok(payouts)
    }

    /// Payouts awaiting an admin decision, oldest first.
    pub async fn pending_payouts(&self, caller: &Caller) -> Result<Vec<PayoutRequest>> {
        caller.require_admin()?;
        let mut payouts: Vec<_> = self
            .store
            .payouts()
            .await?
            .into_iter()
            .filter(|p| !p.status.is_terminal())
            .collect();
        payouts.sort_by_key(|p| (p.created_at, p.id));
        Ok(payouts)
    }

    /// Payouts that have left PENDING, newest first.
    pub async fn settled_payouts(&self, caller: &Caller) -> Result<Vec<PayoutRequest>> {
        caller.require_admin()?;
        let mut payouts: Vec<_> = self
            .store
            .payouts()
            .await?
            .into_iter()
            .filter(|p| p.status != PayoutStatus::Pending)
            .collect();
        newest_first(&mut payouts);
        Ok(payouts)
    }

    pub async fn revenue_totals(&self, caller: &Caller) -> Result<RevenueTotals> {
        caller.require_admin()?;
        let revenue = self.store.snapshot().await?.revenue;
        let total_amount: Balance = revenue.iter().map(|r| r.total_amount).sum();
        let commission_amount: Balance = revenue.iter().map(|r| r.commission_amount).sum();
        Ok(RevenueTotals {
            sales_count: revenue.len(),
            total_amount,
            commission_amount,
            instructor_earnings: total_amount - commission_amount,
        })
    }

    /// Sales grouped by course, highest gross first.
    pub async fn revenue_by_course(&self, caller: &Caller) -> Result<Vec<CourseRevenue>> {
        caller.require_admin()?;
        let revenue = self.store.snapshot().await?.revenue;

        let mut by_course: HashMap<CourseId, CourseRevenue> = HashMap::new();
        for record in &revenue {
            let row = by_course
                .entry(record.course_id)
                .or_insert_with(|| CourseRevenue {
                    course_id: record.course_id,
                    course_title: None,
                    instructor: record.instructor,
                    sales_count: 0,
                    total_amount: Balance::ZERO,
                    commission_amount: Balance::ZERO,
                });
            if row.course_title.is_none() {
                row.course_title = record.course_title.clone();
            }
            row.sales_count += 1;
            row.total_amount += record.total_amount;
            row.commission_amount += record.commission_amount;
        }

        let mut rows: Vec<_> = by_course.into_values().collect();
        rows.sort_by_key(|r| (Reverse(r.total_amount), r.course_id));
        Ok(rows)
    }

    /// Sales and settlements grouped by instructor, highest gross first.
    ///
    /// Both sides are read from one snapshot so paid and earned amounts agree.
    pub async fn revenue_by_instructor(&self, caller: &Caller) -> Result<Vec<InstructorRevenue>> {
        caller.require_admin()?;
        let snapshot = self.store.snapshot().await?;

        let mut paid: HashMap<InstructorId, Balance> = HashMap::new();
        for payout in snapshot
            .payouts
            .iter()
            .filter(|p| p.status == PayoutStatus::Paid)
        {
            *paid.entry(payout.instructor).or_default() += Balance::from(payout.amount);
        }

        let mut by_instructor: HashMap<InstructorId, InstructorRevenue> = HashMap::new();
        for record in &snapshot.revenue {
            let row = by_instructor
                .entry(record.instructor)
                .or_insert_with(|| InstructorRevenue {
                    instructor: record.instructor,
                    sales_count: 0,
                    total_amount: Balance::ZERO,
                    commission_amount: Balance::ZERO,
                    instructor_share: Balance::ZERO,
                    paid_amount: Balance::ZERO,
                    outstanding_amount: Balance::ZERO,
                });
            row.sales_count += 1;
            row.total_amount += record.total_amount;
            row.commission_amount += record.commission_amount;
            row.instructor_share += record.instructor_share();
        }

        let mut rows: Vec<_> = by_instructor
            .into_values()
            .map(|mut row| {
                row.paid_amount = paid.get(&row.instructor).copied().unwrap_or_default();
                row.outstanding_amount = row.instructor_share - row.paid_amount;
                row
            })
            .collect();
        rows.sort_by_key(|r| (Reverse(r.total_amount), r.instructor));
        Ok(rows)
    }

    /// Every recognized sale, newest first.
    pub async fn revenue_transactions(&self, caller: &Caller) -> Result<Vec<RevenueRecord>> {
        caller.require_admin()?;
        let mut revenue = self.store.snapshot().await?.revenue;
        revenue.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.order_id.cmp(&b.order_id))
        });
        Ok(revenue)
    }
}
