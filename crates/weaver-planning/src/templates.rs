//! Template PRDs for demos and fixtures

/// A full-featured commerce PRD exercising every recognized section
pub fn example_prd_text() -> &'static str {
    r#"# Commerce Platform

Version: 1.0.0

## Overview

A storefront where customers browse a catalog, fill a cart, and place
orders. Built and operated by autonomous agent teams.

## Goals

- Launch a minimal storefront within one quarter
- Keep checkout latency under two seconds
- Support independent agent teams working in parallel

## Features

### Auth

- Users can register with email and password
- Users can log in and log out
- Passwords are stored hashed

**Acceptance Criteria:**

- Login with valid credentials succeeds
- Login with invalid credentials fails with a clear message

**Technical Notes:** Sessions are cookie-based with a 24 hour expiry.

### Catalog

- Products have a name, price, and description
- Products can be listed by category
- Product pages render product details

**Acceptance Criteria:**

- Category listing shows every in-stock product

### Cart

- Users can add catalog items to their cart
- Users can change quantities and remove items
- Cart contents persist across sessions

Depends on: Catalog, Auth

### Order

- Checkout converts a cart into an order
- Users receive an order confirmation email

**Acceptance Criteria:**

- An order records the cart contents at checkout time

Depends on: Cart

## Requirements

- All pages respond within two seconds
- The service exposes a health endpoint

## Constraints

- Single-region deployment only
- No third-party analytics
"#
}

/// A minimal PRD with a title and one bare feature
pub fn minimal_prd_text() -> &'static str {
    r#"# Minimal Project

## Features

### Core
"#
}
