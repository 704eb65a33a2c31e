//! Bundled sample QA document used when no input document is given.

use tracing::info;

use crate::artifacts::{ArtifactRef, ArtifactRole, ArtifactStore};
use crate::error::ArtifactError;

/// An e-commerce test plan written the way real QA notes usually are:
/// inconsistent headings, prose mixed with numbered steps, missing fields.
pub const SAMPLE_QA_DOCUMENT: &str = "\
ShopEase Web Store - Release 2.4 QA Test Plan
Prepared by: QA Team        Build: 2.4.0-rc1
-------------------------------------------------

Scope: checkout, accounts, cart and storefront UI. Mobile app out of scope.

TC-001  User Login with Valid Credentials
Priority: High    Type: Functional
Pre: a registered account exists (qa.user@shopease.test)
Steps:
 1. open /login
 2. type email + password
 3. click Sign In
Expected -> user lands on dashboard, name shown top-right

TC-002 - Payment with Credit Card
Priority: CRITICAL
Checkout with a Visa test card through the Stripe payment gateway. Add item
to cart, go to checkout, fill shipping address, enter card 4242 4242 4242 4242,
exp 12/30, CVC 123, confirm order. Order confirmation page + email receipt
should appear and the card is charged exactly once.

TC-003: SQL injection on login form
Priority - Critical   Category: Security
Enter ' OR '1'='1 in the email field and any password, submit.
Then try admin'-- in the email field.
Expected: login rejected, generic error shown, no DB error text leaks,
attempt logged.

TC-004 Add to Cart
prio: medium
1) open any product page 2) choose size/colour 3) click Add to Cart
4) open the cart
expected - item is in the shopping cart with correct price and quantity 1

TC-005 Password reset email
Priority: High
User clicks Forgot Password, enters email, receives reset link within 2 min,
link opens reset page, new password is accepted, old password stops working.
Components: Authentication, Password Management

TC-006   Search results performance
Type: Performance  Priority: Medium
Search for 'shoes' with 10k products in catalog. Results page must render
in under 2 seconds at p95.

TC-007 Footer links
Priority: Low   Type: UI/UX
Check that About, Contact and Privacy links in the footer open the right
pages and nothing is misaligned on a 1366px wide screen.

TC-008 Expired card handling
Priority: High
Pay with a card whose expiry date is in the past.
Expected: payment declined with a clear message, order NOT created,
cart contents kept.

TC-009 Cart quantity limits (edge case)
Set quantity to 0, then -1, then 999 for one cart item.
Expected: 0 removes the item, negative values rejected, 999 capped at stock.

Notes: TC-002 and TC-008 need the payment sandbox enabled.
";

/// Write the sample document into the store, or reuse the one already there.
pub fn materialize(store: &ArtifactStore, reuse_existing: bool) -> Result<ArtifactRef, ArtifactError> {
    if reuse_existing && store.exists(ArtifactRole::SourceDocument) {
        info!(path = %store.path(ArtifactRole::SourceDocument).display(), "Reusing sample document");
        return store.reference(ArtifactRole::SourceDocument);
    }

    let written = store.write(ArtifactRole::SourceDocument, SAMPLE_QA_DOCUMENT.as_bytes())?;
    info!(path = %written.path.display(), "Generated sample document");
    Ok(written)
}
